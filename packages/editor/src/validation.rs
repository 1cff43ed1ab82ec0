//! # Field Validation
//!
//! Runs a field policy's checks against a candidate value. A failure is a
//! message, never an error: messages are stored per path in
//! [`ValidationErrors`] and gate the submit actions.

use std::collections::BTreeMap;

use jsonedit_path::FieldPath;
use serde_json::Value;

use crate::date::{format_date, parse_date};
use crate::policy::{FieldPolicy, SelectOption, ValidationRule};

/// Check `value` against `policy`; `None` when the value is acceptable.
///
/// Null and absent values are always accepted: they render as an empty
/// input and the host may legitimately hold them.
pub fn validate(value: Option<&Value>, policy: &FieldPolicy) -> Option<String> {
    let value = match value {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    match policy {
        FieldPolicy::Text { validation } | FieldPolicy::TextArea { validation } => {
            let rule = validation.as_ref()?;
            check_text(&display_text(value), rule)
        }
        FieldPolicy::Number { validation } => check_number(value, validation.as_ref()),
        FieldPolicy::Boolean => match value {
            Value::Bool(_) => None,
            _ => Some("Must be true or false".to_string()),
        },
        FieldPolicy::Date { format, min, max } => {
            let text = display_text(value);
            let Some(date) = parse_date(&text, *format) else {
                return Some(format!("Must be a date in {} format", format));
            };
            if let Some(min) = min {
                if date < *min {
                    return Some(format!("Must be on or after {}", format_date(*min, *format)));
                }
            }
            if let Some(max) = max {
                if date > *max {
                    return Some(format!("Must be on or before {}", format_date(*max, *format)));
                }
            }
            None
        }
        FieldPolicy::Select { options } | FieldPolicy::Radio { options } => check_option(value, options),
    }
}

/// Text a widget shows for a leaf: strings as-is, other scalars in JSON form
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn check_text(text: &str, rule: &ValidationRule) -> Option<String> {
    match rule {
        ValidationRule::Pattern { regex, message } => {
            if regex.is_match(text) {
                None
            } else {
                Some(message.clone().unwrap_or_else(|| "Invalid format".to_string()))
            }
        }
        ValidationRule::Bounds {
            min_length,
            max_length,
            message,
            ..
        } => {
            let count = text.chars().count();
            let too_short = min_length.is_some_and(|min| count < min);
            let too_long = max_length.is_some_and(|max| count > max);
            if !too_short && !too_long {
                return None;
            }
            Some(
                message
                    .clone()
                    .unwrap_or_else(|| length_message(*min_length, *max_length)),
            )
        }
    }
}

fn check_number(value: &Value, rule: Option<&ValidationRule>) -> Option<String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return Some("Must be a number".to_string());
    };

    let rule = rule?;
    if let ValidationRule::Bounds {
        min_value,
        max_value,
        message,
        ..
    } = rule
    {
        let below = min_value.is_some_and(|min| number < min);
        let above = max_value.is_some_and(|max| number > max);
        if below || above {
            return Some(message.clone().unwrap_or_else(|| range_message(*min_value, *max_value)));
        }
    }

    check_text(&display_text(value), rule)
}

fn check_option(value: &Value, options: &[SelectOption]) -> Option<String> {
    let text = display_text(value);
    if options.iter().any(|option| option.key == text) {
        return None;
    }
    let keys: Vec<&str> = options.iter().map(|option| option.key.as_str()).collect();
    Some(format!("Must be one of: {}", keys.join(", ")))
}

fn length_message(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("Must be between {} and {} characters", min, max),
        (Some(min), None) => format!("Must be at least {} characters", min),
        (None, Some(max)) => format!("Must be at most {} characters", max),
        (None, None) => "Invalid length".to_string(),
    }
}

fn range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("Must be between {} and {}", min, max),
        (Some(min), None) => format!("Must be at least {}", min),
        (None, Some(max)) => format!("Must be at most {}", max),
        (None, None) => "Out of range".to_string(),
    }
}

/// Current validation message per concrete path.
///
/// Only failing paths are stored, so an empty set means every field is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    messages: BTreeMap<FieldPath, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a validation run for `path`
    pub fn record(&mut self, path: &FieldPath, outcome: Option<String>) {
        match outcome {
            Some(message) if !message.is_empty() => {
                self.messages.insert(path.clone(), message);
            }
            _ => {
                self.messages.remove(path);
            }
        }
    }

    pub fn clear_path(&mut self, path: &FieldPath) -> Option<String> {
        self.messages.remove(path)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn message(&self, path: &FieldPath) -> Option<&str> {
        self.messages.get(path).map(String::as_str)
    }

    pub fn has_error(&self, path: &FieldPath) -> bool {
        self.messages.contains_key(path)
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Paths currently holding a message, in path order
    pub fn paths(&self) -> Vec<FieldPath> {
        self.messages.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.messages.iter().map(|(path, message)| (path, message.as_str()))
    }
}
