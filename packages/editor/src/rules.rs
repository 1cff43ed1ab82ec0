//! # Editability Rules
//!
//! Hosts describe which leaves are editable with two maps keyed by rule path:
//!
//! ```json
//! {
//!   "editableFields": {
//!     "name": true,
//!     "age": { "type": "number", "validations": { "minValue": 0, "maxValue": 120 } },
//!     "items.[].status": { "type": "select", "options": [{ "key": "open", "value": "Open" }] }
//!   },
//!   "nonEditableFields": { "items.0.status": true }
//! }
//! ```
//!
//! The maps are deserialized as-is and then compiled. Compilation checks
//! every descriptor and rule path up front, so a bad configuration fails at
//! registration instead of producing silently wrong editability later.

use std::collections::{BTreeMap, HashMap, HashSet};

use jsonedit_path::{PathError, RulePath};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::date::{parse_date, DateFormat};
use crate::policy::{FieldKind, FieldPolicy, SelectOption, ValidationRule};

/// Editable-fields map as supplied by the host
pub type EditableFields = BTreeMap<String, EditableRule>;

/// Non-editable-fields map as supplied by the host
pub type NonEditableFields = BTreeMap<String, bool>;

/// Value of one editable-fields entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditableRule {
    /// `true`: editable, policy inferred from the leaf
    Flag(bool),

    /// Explicit field descriptor
    Field(FieldDescriptor),
}

/// Field descriptor as written by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldDescriptor {
    #[serde(rename = "string")]
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validations: Option<Validations>,
    },

    #[serde(rename = "number")]
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validations: Option<Validations>,
    },

    #[serde(rename = "textArea", alias = "textarea")]
    TextArea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validations: Option<Validations>,
    },

    #[serde(rename = "boolean")]
    Boolean,

    #[serde(rename = "date")]
    Date {
        format: DateFormat,
        #[serde(rename = "minDate", default, skip_serializing_if = "Option::is_none")]
        min_date: Option<String>,
        #[serde(rename = "maxDate", default, skip_serializing_if = "Option::is_none")]
        max_date: Option<String>,
    },

    #[serde(rename = "select")]
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },

    #[serde(rename = "radio")]
    Radio {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
}

impl FieldDescriptor {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldDescriptor::String { .. } => FieldKind::String,
            FieldDescriptor::Number { .. } => FieldKind::Number,
            FieldDescriptor::TextArea { .. } => FieldKind::TextArea,
            FieldDescriptor::Boolean => FieldKind::Boolean,
            FieldDescriptor::Date { .. } => FieldKind::Date,
            FieldDescriptor::Select { .. } => FieldKind::Select,
            FieldDescriptor::Radio { .. } => FieldKind::Radio,
        }
    }

    /// Check this descriptor and turn it into a policy.
    ///
    /// `rule` names the rule path in errors.
    pub fn compile(&self, rule: &str) -> Result<FieldPolicy, ConfigError> {
        let kind = self.kind();
        match self {
            FieldDescriptor::String { validations } => Ok(FieldPolicy::Text {
                validation: compile_validations(rule, kind, validations.as_ref())?,
            }),
            FieldDescriptor::TextArea { validations } => Ok(FieldPolicy::TextArea {
                validation: compile_validations(rule, kind, validations.as_ref())?,
            }),
            FieldDescriptor::Number { validations } => Ok(FieldPolicy::Number {
                validation: compile_validations(rule, kind, validations.as_ref())?,
            }),
            FieldDescriptor::Boolean => Ok(FieldPolicy::Boolean),
            FieldDescriptor::Date {
                format,
                min_date,
                max_date,
            } => {
                let min = compile_date_bound(rule, *format, min_date.as_deref())?;
                let max = compile_date_bound(rule, *format, max_date.as_deref())?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(ConfigError::InvertedBounds {
                            rule: rule.to_string(),
                        });
                    }
                }
                Ok(FieldPolicy::Date {
                    format: *format,
                    min,
                    max,
                })
            }
            FieldDescriptor::Select { options } => Ok(FieldPolicy::Select {
                options: compile_options(rule, kind, options)?,
            }),
            FieldDescriptor::Radio { options } => Ok(FieldPolicy::Radio {
                options: compile_options(rule, kind, options)?,
            }),
        }
    }
}

/// Validation settings of a text or number field.
///
/// Length settings (`minLength`, `maxLength`, `validationMessage`) and regex
/// settings (`regex`, `regexValidationMessage`) are mutually exclusive.
/// `minValue`/`maxValue` are only valid on number fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Validations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_validation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid rule path '{rule}': {source}")]
    InvalidRulePath {
        rule: String,
        #[source]
        source: PathError,
    },

    #[error("Rule '{0}' targets the tree root; only leaves can be editable")]
    RootRule(String),

    #[error("Rule '{0}' is set to false; omit the entry instead")]
    FalseFlag(String),

    #[error("{kind:?} field '{rule}' needs at least one option")]
    EmptyOptions { rule: String, kind: FieldKind },

    #[error("Field '{rule}' has duplicate option key '{key}'")]
    DuplicateOption { rule: String, key: String },

    #[error("Field '{0}' mixes regex validation with length validation")]
    ConflictingValidations(String),

    #[error("{kind:?} field '{rule}' cannot use minValue/maxValue")]
    RangeOnNonNumeric { rule: String, kind: FieldKind },

    #[error("Field '{rule}' has a minimum greater than its maximum")]
    InvertedBounds { rule: String },

    #[error("Field '{rule}' has an invalid regex: {source}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Field '{rule}' has date bound '{value}' that is not in {format} format")]
    InvalidDateBound {
        rule: String,
        value: String,
        format: DateFormat,
    },
}

fn compile_validations(
    rule: &str,
    kind: FieldKind,
    validations: Option<&Validations>,
) -> Result<Option<ValidationRule>, ConfigError> {
    let Some(v) = validations else {
        return Ok(None);
    };

    let has_length = v.min_length.is_some() || v.max_length.is_some() || v.validation_message.is_some();
    let has_range = v.min_value.is_some() || v.max_value.is_some();
    let has_regex = v.regex.is_some() || v.regex_validation_message.is_some();

    if has_range && kind != FieldKind::Number {
        return Err(ConfigError::RangeOnNonNumeric {
            rule: rule.to_string(),
            kind,
        });
    }

    if has_regex && (has_length || has_range) {
        return Err(ConfigError::ConflictingValidations(rule.to_string()));
    }

    if has_regex {
        let Some(pattern) = &v.regex else {
            return Err(ConfigError::ConflictingValidations(rule.to_string()));
        };
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
            rule: rule.to_string(),
            source,
        })?;
        return Ok(Some(ValidationRule::Pattern {
            regex,
            message: v.regex_validation_message.clone(),
        }));
    }

    if let (Some(min), Some(max)) = (v.min_length, v.max_length) {
        if min > max {
            return Err(ConfigError::InvertedBounds { rule: rule.to_string() });
        }
    }
    if let (Some(min), Some(max)) = (v.min_value, v.max_value) {
        if min > max {
            return Err(ConfigError::InvertedBounds { rule: rule.to_string() });
        }
    }

    if !has_length && !has_range {
        return Ok(None);
    }

    Ok(Some(ValidationRule::Bounds {
        min_length: v.min_length,
        max_length: v.max_length,
        min_value: v.min_value,
        max_value: v.max_value,
        message: v.validation_message.clone(),
    }))
}

fn compile_date_bound(
    rule: &str,
    format: DateFormat,
    bound: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, ConfigError> {
    bound
        .map(|text| {
            parse_date(text, format).ok_or_else(|| ConfigError::InvalidDateBound {
                rule: rule.to_string(),
                value: text.to_string(),
                format,
            })
        })
        .transpose()
}

fn compile_options(rule: &str, kind: FieldKind, options: &[SelectOption]) -> Result<Vec<SelectOption>, ConfigError> {
    if options.is_empty() {
        return Err(ConfigError::EmptyOptions {
            rule: rule.to_string(),
            kind,
        });
    }

    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.key.as_str()) {
            return Err(ConfigError::DuplicateOption {
                rule: rule.to_string(),
                key: option.key.clone(),
            });
        }
    }

    Ok(options.to_vec())
}

fn parse_rule_path(rule: &str) -> Result<RulePath, ConfigError> {
    let path = RulePath::parse(rule).map_err(|source| ConfigError::InvalidRulePath {
        rule: rule.to_string(),
        source,
    })?;
    if path.is_empty() {
        return Err(ConfigError::RootRule(rule.to_string()));
    }
    Ok(path)
}

/// Both rule maps, checked and split into exact and wildcard rules.
///
/// Exact rules are keyed by their canonical dotted form. `None` as a policy
/// means "editable, infer the policy from the leaf".
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub exact_editable: HashMap<String, Option<FieldPolicy>>,
    pub exact_denied: HashSet<String>,
    pub wildcard_editable: Vec<(RulePath, Option<FieldPolicy>)>,
    pub wildcard_denied: Vec<RulePath>,
}

impl CompiledRules {
    pub fn compile(editable: &EditableFields, non_editable: &NonEditableFields) -> Result<Self, ConfigError> {
        let mut rules = CompiledRules::default();

        for (rule, entry) in editable {
            let path = parse_rule_path(rule)?;
            let policy = match entry {
                EditableRule::Flag(true) => None,
                EditableRule::Flag(false) => return Err(ConfigError::FalseFlag(rule.clone())),
                EditableRule::Field(descriptor) => Some(descriptor.compile(rule)?),
            };

            if path.has_wildcard() {
                rules.wildcard_editable.push((path, policy));
            } else {
                rules.exact_editable.insert(path.to_string(), policy);
            }
        }

        for (rule, flag) in non_editable {
            if !flag {
                return Err(ConfigError::FalseFlag(rule.clone()));
            }
            let path = parse_rule_path(rule)?;
            if path.has_wildcard() {
                rules.wildcard_denied.push(path);
            } else {
                rules.exact_denied.insert(path.to_string());
            }
        }

        debug!(
            exact_editable = rules.exact_editable.len(),
            wildcard_editable = rules.wildcard_editable.len(),
            exact_denied = rules.exact_denied.len(),
            wildcard_denied = rules.wildcard_denied.len(),
            "Compiled editability rules"
        );

        Ok(rules)
    }

    pub fn has_wildcards(&self) -> bool {
        !self.wildcard_editable.is_empty() || !self.wildcard_denied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editable(value: serde_json::Value) -> EditableFields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_flag_and_descriptors() {
        let fields = editable(json!({
            "name": true,
            "bio": {"type": "textarea", "validations": {"maxLength": 200}},
            "born": {"type": "date", "format": "YYYY-MM-DD", "minDate": "1900-01-01"},
            "role": {"type": "radio", "options": [{"key": "a", "value": "Admin"}]},
            "active": {"type": "boolean"}
        }));

        assert_eq!(fields["name"], EditableRule::Flag(true));
        assert!(matches!(
            &fields["bio"],
            EditableRule::Field(FieldDescriptor::TextArea { validations: Some(_) })
        ));
        assert!(matches!(&fields["active"], EditableRule::Field(FieldDescriptor::Boolean)));

        let rules = CompiledRules::compile(&fields, &NonEditableFields::new()).unwrap();
        assert_eq!(rules.exact_editable.len(), 5);
        assert_eq!(rules.exact_editable["name"], None);
    }

    #[test]
    fn test_wildcard_rules_split_out() {
        let fields = editable(json!({"items.[].name": true, "title": true}));
        let denied: NonEditableFields = [("items.0.name".to_string(), true), ("x.[]".to_string(), true)].into();

        let rules = CompiledRules::compile(&fields, &denied).unwrap();
        assert_eq!(rules.wildcard_editable.len(), 1);
        assert_eq!(rules.wildcard_denied.len(), 1);
        assert!(rules.exact_denied.contains("items.0.name"));
        assert!(rules.has_wildcards());
    }

    #[test]
    fn test_empty_options_fail_fast() {
        let fields = editable(json!({"theme": {"type": "select", "options": []}}));
        let err = CompiledRules::compile(&fields, &NonEditableFields::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyOptions {
                rule: "theme".into(),
                kind: FieldKind::Select
            }
        );

        let fields = editable(json!({"size": {"type": "radio"}}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::EmptyOptions { .. })
        ));
    }

    #[test]
    fn test_regex_and_length_are_exclusive() {
        let fields = editable(json!({
            "code": {"type": "string", "validations": {"regex": "^[A-Z]+$", "maxLength": 4}}
        }));
        assert_eq!(
            CompiledRules::compile(&fields, &NonEditableFields::new()).unwrap_err(),
            ConfigError::ConflictingValidations("code".into())
        );
    }

    #[test]
    fn test_range_only_on_numbers() {
        let fields = editable(json!({"name": {"type": "string", "validations": {"minValue": 1}}}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::RangeOnNonNumeric { kind: FieldKind::String, .. })
        ));
    }

    #[test]
    fn test_invalid_regex_and_bounds() {
        let fields = editable(json!({"code": {"type": "string", "validations": {"regex": "("}}}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::InvalidRegex { .. })
        ));

        let fields = editable(json!({"age": {"type": "number", "validations": {"minValue": 10, "maxValue": 1}}}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_date_bounds_must_match_format() {
        let fields = editable(json!({"due": {"type": "date", "format": "DD/MM/YYYY", "maxDate": "2024-12-31"}}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::InvalidDateBound { .. })
        ));
    }

    #[test]
    fn test_malformed_rule_paths() {
        let fields = editable(json!({"items.[*].name": true}));
        assert!(matches!(
            CompiledRules::compile(&fields, &NonEditableFields::new()),
            Err(ConfigError::InvalidRulePath { .. })
        ));

        let fields = editable(json!({"": true}));
        assert_eq!(
            CompiledRules::compile(&fields, &NonEditableFields::new()).unwrap_err(),
            ConfigError::RootRule(String::new())
        );

        let denied: NonEditableFields = [("a".to_string(), false)].into();
        assert_eq!(
            CompiledRules::compile(&EditableFields::new(), &denied).unwrap_err(),
            ConfigError::FalseFlag("a".into())
        );
    }

    #[test]
    fn test_unknown_validation_key_rejected_at_parse() {
        let parsed: Result<EditableFields, _> =
            serde_json::from_value(json!({"a": {"type": "string", "validations": {"minLen": 1}}}));
        assert!(parsed.is_err());
    }
}
