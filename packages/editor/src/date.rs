//! Date formats accepted by `date` fields

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Length of a well-formed date string in any supported format
const DATE_WIDTH: usize = 10;

/// Display/storage format of a date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYearSlash,
    #[serde(rename = "YYYY/MM/DD")]
    YearMonthDaySlash,
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYearSlash,
    #[serde(rename = "DD-MM-YYYY")]
    DayMonthYearDash,
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDayDash,
    #[serde(rename = "MM-DD-YYYY")]
    MonthDayYearDash,
}

impl DateFormat {
    pub const ALL: [DateFormat; 6] = [
        DateFormat::DayMonthYearSlash,
        DateFormat::YearMonthDaySlash,
        DateFormat::MonthDayYearSlash,
        DateFormat::DayMonthYearDash,
        DateFormat::YearMonthDayDash,
        DateFormat::MonthDayYearDash,
    ];

    /// Look a format up by its pattern name; `None` if unsupported
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.pattern() == name)
    }

    /// Pattern name as written in field descriptors
    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayMonthYearSlash => "DD/MM/YYYY",
            DateFormat::YearMonthDaySlash => "YYYY/MM/DD",
            DateFormat::MonthDayYearSlash => "MM/DD/YYYY",
            DateFormat::DayMonthYearDash => "DD-MM-YYYY",
            DateFormat::YearMonthDayDash => "YYYY-MM-DD",
            DateFormat::MonthDayYearDash => "MM-DD-YYYY",
        }
    }

    fn strftime(self) -> &'static str {
        match self {
            DateFormat::DayMonthYearSlash => "%d/%m/%Y",
            DateFormat::YearMonthDaySlash => "%Y/%m/%d",
            DateFormat::MonthDayYearSlash => "%m/%d/%Y",
            DateFormat::DayMonthYearDash => "%d-%m-%Y",
            DateFormat::YearMonthDayDash => "%Y-%m-%d",
            DateFormat::MonthDayYearDash => "%m-%d-%Y",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Parse `text` written in `format`.
///
/// Day and month must be two digits and the year four, as in `05/03/2024`.
pub fn parse_date(text: &str, format: DateFormat) -> Option<NaiveDate> {
    if text.len() != DATE_WIDTH {
        return None;
    }
    NaiveDate::parse_from_str(text, format.strftime()).ok()
}

/// Parse `text` with a format given by name.
///
/// An unsupported format name yields `None` rather than an error, so the
/// caller can fall back to showing the raw text.
pub fn parse_date_with(text: &str, format_name: &str) -> Option<NaiveDate> {
    DateFormat::parse(format_name).and_then(|format| parse_date(text, format))
}

/// Write `date` in `format`
pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    date.format(format.strftime()).to_string()
}
