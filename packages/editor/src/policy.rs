//! # Field Policies
//!
//! A policy is the checked, ready-to-use form of a field descriptor: which
//! input the renderer shows for a leaf and which validation applies to it.
//! Policies are only produced by compiling descriptors (see `rules`) or by
//! inference from a leaf's runtime type, so every policy is well-formed.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::{format_date, DateFormat};
use crate::rules::{FieldDescriptor, Validations};

/// Input kind of an editable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Select,
    Radio,
    TextArea,
}

/// One choice of a select or radio field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored value
    pub key: String,
    /// Label shown to the user
    pub value: String,
}

/// Compiled validation rule of a text or number field
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Length and (number fields only) range limits
    Bounds {
        min_length: Option<usize>,
        max_length: Option<usize>,
        min_value: Option<f64>,
        max_value: Option<f64>,
        message: Option<String>,
    },

    /// Pattern the raw text must match
    Pattern { regex: Regex, message: Option<String> },
}

impl PartialEq for ValidationRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ValidationRule::Bounds {
                    min_length,
                    max_length,
                    min_value,
                    max_value,
                    message,
                },
                ValidationRule::Bounds {
                    min_length: other_min_length,
                    max_length: other_max_length,
                    min_value: other_min_value,
                    max_value: other_max_value,
                    message: other_message,
                },
            ) => {
                min_length == other_min_length
                    && max_length == other_max_length
                    && min_value == other_min_value
                    && max_value == other_max_value
                    && message == other_message
            }
            (
                ValidationRule::Pattern { regex, message },
                ValidationRule::Pattern {
                    regex: other_regex,
                    message: other_message,
                },
            ) => regex.as_str() == other_regex.as_str() && message == other_message,
            _ => false,
        }
    }
}

impl ValidationRule {
    fn to_validations(&self) -> Validations {
        match self {
            ValidationRule::Bounds {
                min_length,
                max_length,
                min_value,
                max_value,
                message,
            } => Validations {
                min_length: *min_length,
                max_length: *max_length,
                min_value: *min_value,
                max_value: *max_value,
                validation_message: message.clone(),
                ..Validations::default()
            },
            ValidationRule::Pattern { regex, message } => Validations {
                regex: Some(regex.as_str().to_string()),
                regex_validation_message: message.clone(),
                ..Validations::default()
            },
        }
    }
}

/// Editing policy of one leaf
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "FieldDescriptor")]
pub enum FieldPolicy {
    Text { validation: Option<ValidationRule> },
    TextArea { validation: Option<ValidationRule> },
    Number { validation: Option<ValidationRule> },
    Boolean,
    Date {
        format: DateFormat,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    Select { options: Vec<SelectOption> },
    Radio { options: Vec<SelectOption> },
}

impl FieldPolicy {
    /// Plain text input without validation
    pub fn text() -> Self {
        FieldPolicy::Text { validation: None }
    }

    /// Policy for a leaf with no explicit descriptor.
    ///
    /// With type-based rendering, numbers get a number input and booleans a
    /// boolean input; everything else (and everything without type-based
    /// rendering) gets a text input.
    pub fn inferred(value: Option<&Value>, type_based: bool) -> Self {
        if !type_based {
            return Self::text();
        }
        match value {
            Some(Value::Number(_)) => FieldPolicy::Number { validation: None },
            Some(Value::Bool(_)) => FieldPolicy::Boolean,
            _ => Self::text(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldPolicy::Text { .. } => FieldKind::String,
            FieldPolicy::TextArea { .. } => FieldKind::TextArea,
            FieldPolicy::Number { .. } => FieldKind::Number,
            FieldPolicy::Boolean => FieldKind::Boolean,
            FieldPolicy::Date { .. } => FieldKind::Date,
            FieldPolicy::Select { .. } => FieldKind::Select,
            FieldPolicy::Radio { .. } => FieldKind::Radio,
        }
    }

    pub fn validation(&self) -> Option<&ValidationRule> {
        match self {
            FieldPolicy::Text { validation }
            | FieldPolicy::TextArea { validation }
            | FieldPolicy::Number { validation } => validation.as_ref(),
            _ => None,
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        match self {
            FieldPolicy::Select { options } | FieldPolicy::Radio { options } => options,
            _ => &[],
        }
    }

    /// Convert a raw widget value into the value stored in the draft.
    ///
    /// Number fields turn numeric text into numbers (integers stay integers)
    /// and boolean fields accept `"true"`/`"false"`. Anything that does not
    /// convert is kept as given; validation then reports it.
    pub fn coerce(&self, raw: Value) -> Value {
        match (self, raw) {
            (FieldPolicy::Number { .. }, Value::String(text)) => parse_number(&text).unwrap_or(Value::String(text)),
            (FieldPolicy::Boolean, Value::String(text)) => match text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(text),
            },
            (_, raw) => raw,
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

impl From<FieldPolicy> for FieldDescriptor {
    fn from(policy: FieldPolicy) -> Self {
        let validations = |rule: Option<ValidationRule>| rule.map(|r| r.to_validations());
        match policy {
            FieldPolicy::Text { validation } => FieldDescriptor::String {
                validations: validations(validation),
            },
            FieldPolicy::TextArea { validation } => FieldDescriptor::TextArea {
                validations: validations(validation),
            },
            FieldPolicy::Number { validation } => FieldDescriptor::Number {
                validations: validations(validation),
            },
            FieldPolicy::Boolean => FieldDescriptor::Boolean,
            FieldPolicy::Date { format, min, max } => FieldDescriptor::Date {
                format,
                min_date: min.map(|d| format_date(d, format)),
                max_date: max.map(|d| format_date(d, format)),
            },
            FieldPolicy::Select { options } => FieldDescriptor::Select { options },
            FieldPolicy::Radio { options } => FieldDescriptor::Radio { options },
        }
    }
}
