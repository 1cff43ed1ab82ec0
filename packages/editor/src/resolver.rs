//! # Editability Resolver
//!
//! Decides, for one concrete path, whether the leaf may be edited and with
//! which policy. Order of checks:
//!
//! 1. exact non-editable rule → denied
//! 2. exact editable rule → editable with that rule's policy
//! 3. path with an array index → wildcard rules (a deny match wins), or the
//!    index-stripped path against exact rules when no wildcard rule exists
//! 4. otherwise `allFieldsEditable`, with a policy inferred from the leaf
//!
//! Wildcard rules live in two tries that are built on first use and dropped
//! whenever the rule maps change.

use std::cell::OnceCell;

use jsonedit_path::{FieldPath, PathTrie};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::policy::FieldPolicy;
use crate::rules::{CompiledRules, ConfigError, EditableFields, NonEditableFields};
use crate::tree::is_container;

/// Why a leaf is not editable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenyReason {
    /// A non-editable rule matches the path
    NonEditableRule,
    /// No rule matches and `allFieldsEditable` is off
    NoMatchingRule,
    /// The path names the root or a mapping/sequence, not a leaf
    NotALeaf,
}

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub editable: bool,
    pub denied: bool,
    #[serde(rename = "descriptor", skip_serializing_if = "Option::is_none")]
    pub policy: Option<FieldPolicy>,
    #[serde(rename = "deniedReason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    /// Rule that decided the outcome, in dotted form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<String>,
}

impl Resolution {
    fn editable(policy: FieldPolicy, matched_rule: Option<String>) -> Self {
        Self {
            editable: true,
            denied: false,
            policy: Some(policy),
            reason: None,
            matched_rule,
        }
    }

    fn denied(matched_rule: String) -> Self {
        Self {
            editable: false,
            denied: true,
            policy: None,
            reason: Some(DenyReason::NonEditableRule),
            matched_rule: Some(matched_rule),
        }
    }

    fn not_editable(reason: DenyReason) -> Self {
        Self {
            editable: false,
            denied: false,
            policy: None,
            reason: Some(reason),
            matched_rule: None,
        }
    }
}

struct RuleTries {
    editable: PathTrie<Option<FieldPolicy>>,
    denied: PathTrie<()>,
}

impl RuleTries {
    fn build(rules: &CompiledRules) -> Self {
        let editable = rules
            .wildcard_editable
            .iter()
            .map(|(rule, policy)| (rule.clone(), policy.clone()))
            .collect();
        let denied = rules.wildcard_denied.iter().map(|rule| (rule.clone(), ())).collect();
        Self { editable, denied }
    }
}

/// Rule maps plus the global toggles that affect resolution
pub struct Resolver {
    editable_fields: EditableFields,
    non_editable_fields: NonEditableFields,
    rules: CompiledRules,
    tries: OnceCell<RuleTries>,
    all_fields_editable: bool,
    type_based_rendering: bool,
}

impl Resolver {
    /// Compile both rule maps; fails on the first malformed rule
    pub fn new(
        editable_fields: EditableFields,
        non_editable_fields: NonEditableFields,
        all_fields_editable: bool,
        type_based_rendering: bool,
    ) -> Result<Self, ConfigError> {
        let rules = CompiledRules::compile(&editable_fields, &non_editable_fields)?;
        Ok(Self {
            editable_fields,
            non_editable_fields,
            rules,
            tries: OnceCell::new(),
            all_fields_editable,
            type_based_rendering,
        })
    }

    /// Replace the rule maps.
    ///
    /// Returns `Ok(false)` when both maps equal the current ones; nothing is
    /// recompiled then. On error the current rules stay in place.
    pub fn update_rules(
        &mut self,
        editable_fields: EditableFields,
        non_editable_fields: NonEditableFields,
    ) -> Result<bool, ConfigError> {
        if editable_fields == self.editable_fields && non_editable_fields == self.non_editable_fields {
            debug!("Rule maps unchanged, keeping compiled rules");
            return Ok(false);
        }

        let rules = CompiledRules::compile(&editable_fields, &non_editable_fields)?;
        self.editable_fields = editable_fields;
        self.non_editable_fields = non_editable_fields;
        self.rules = rules;
        self.tries = OnceCell::new();
        info!(
            editable = self.editable_fields.len(),
            non_editable = self.non_editable_fields.len(),
            "Editability rules replaced"
        );
        Ok(true)
    }

    pub fn set_all_fields_editable(&mut self, enabled: bool) {
        self.all_fields_editable = enabled;
    }

    pub fn set_type_based_rendering(&mut self, enabled: bool) {
        self.type_based_rendering = enabled;
    }

    pub fn editable_fields(&self) -> &EditableFields {
        &self.editable_fields
    }

    pub fn non_editable_fields(&self) -> &NonEditableFields {
        &self.non_editable_fields
    }

    /// Whether the wildcard tries have been built since the last rule change
    pub fn tries_built(&self) -> bool {
        self.tries.get().is_some()
    }

    fn tries(&self) -> &RuleTries {
        self.tries.get_or_init(|| {
            let tries = RuleTries::build(&self.rules);
            debug!(
                editable = tries.editable.len(),
                denied = tries.denied.len(),
                "Built wildcard rule tries"
            );
            tries
        })
    }

    fn policy_for(&self, policy: Option<&FieldPolicy>, value: Option<&Value>) -> FieldPolicy {
        policy
            .cloned()
            .unwrap_or_else(|| FieldPolicy::inferred(value, self.type_based_rendering))
    }

    /// Resolve `path`, whose current value is `value`.
    ///
    /// Pure query: only the lazily built tries may be initialized.
    pub fn resolve(&self, path: &FieldPath, value: Option<&Value>) -> Resolution {
        if path.is_root() || value.is_some_and(is_container) {
            return Resolution::not_editable(DenyReason::NotALeaf);
        }

        let key = path.to_string();
        if self.rules.exact_denied.contains(&key) {
            return Resolution::denied(key);
        }
        if let Some(policy) = self.rules.exact_editable.get(&key) {
            return Resolution::editable(self.policy_for(policy.as_ref(), value), Some(key));
        }

        if path.contains_index() {
            if self.rules.has_wildcards() {
                let tries = self.tries();
                if let Some(found) = tries.denied.resolve_best(path) {
                    return Resolution::denied(found.rule.to_string());
                }
                if let Some(found) = tries.editable.resolve_best(path) {
                    let policy = self.policy_for(found.value.as_ref(), value);
                    return Resolution::editable(policy, Some(found.rule.to_string()));
                }
            } else {
                let stripped = path.strip_indices();
                if self.rules.exact_denied.contains(&stripped) {
                    return Resolution::denied(stripped);
                }
                if let Some(policy) = self.rules.exact_editable.get(&stripped) {
                    return Resolution::editable(self.policy_for(policy.as_ref(), value), Some(stripped));
                }
            }
        }

        if self.all_fields_editable {
            Resolution::editable(FieldPolicy::inferred(value, self.type_based_rendering), None)
        } else {
            Resolution::not_editable(DenyReason::NoMatchingRule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FieldKind;
    use serde_json::json;

    fn resolver(editable: Value, non_editable: Value, all_fields_editable: bool) -> Resolver {
        Resolver::new(
            serde_json::from_value(editable).unwrap(),
            serde_json::from_value(non_editable).unwrap(),
            all_fields_editable,
            true,
        )
        .unwrap()
    }

    fn path(text: &str) -> FieldPath {
        FieldPath::parse(text).unwrap()
    }

    #[test]
    fn test_wildcard_with_exact_deny() {
        let r = resolver(json!({"a.[].b": true}), json!({"a.2.b": true}), false);

        let denied = r.resolve(&path("a.2.b"), Some(&json!("x")));
        assert!(denied.denied);
        assert!(!denied.editable);

        let allowed = r.resolve(&path("a.3.b"), Some(&json!("x")));
        assert!(allowed.editable);
        assert_eq!(allowed.matched_rule.as_deref(), Some("a.[].b"));
    }

    #[test]
    fn test_deny_overrides_same_exact_rule() {
        let r = resolver(json!({"name": true}), json!({"name": true}), true);
        assert!(r.resolve(&path("name"), Some(&json!("x"))).denied);
    }

    #[test]
    fn test_wildcard_deny_beats_wildcard_allow() {
        let r = resolver(json!({"rows.[].cells.[]": true}), json!({"rows.[].cells.0": true}), false);
        assert!(r.resolve(&path("rows.4.cells.0"), Some(&json!(1))).denied);
        assert!(r.resolve(&path("rows.4.cells.1"), Some(&json!(1))).editable);
    }

    #[test]
    fn test_exact_editable_beats_wildcard_deny() {
        let r = resolver(json!({"items.1.name": true}), json!({"items.[].name": true}), false);
        assert!(r.resolve(&path("items.1.name"), Some(&json!("a"))).editable);
        assert!(r.resolve(&path("items.2.name"), Some(&json!("a"))).denied);
    }

    #[test]
    fn test_strip_indices_fallback_without_wildcards() {
        let r = resolver(json!({"items.name": true}), json!({}), false);
        assert!(r.resolve(&path("items.3.name"), Some(&json!("a"))).editable);
        assert!(!r.resolve(&path("items.3.id"), Some(&json!("a"))).editable);
        assert!(!r.tries_built());
    }

    #[test]
    fn test_all_fields_editable_infers_policy() {
        let r = resolver(json!({}), json!({}), true);
        let resolved = r.resolve(&path("count"), Some(&json!(4)));
        assert_eq!(resolved.policy.map(|p| p.kind()), Some(FieldKind::Number));

        let r = resolver(json!({}), json!({}), false);
        let resolved = r.resolve(&path("count"), Some(&json!(4)));
        assert_eq!(resolved.reason, Some(DenyReason::NoMatchingRule));
    }

    #[test]
    fn test_flag_rule_uses_inferred_policy() {
        let r = resolver(json!({"active": true}), json!({}), false);
        let resolved = r.resolve(&path("active"), Some(&json!(false)));
        assert_eq!(resolved.policy, Some(FieldPolicy::Boolean));
    }

    #[test]
    fn test_containers_are_never_editable() {
        let r = resolver(json!({"meta": true}), json!({}), true);
        assert_eq!(
            r.resolve(&path("meta"), Some(&json!({"a": 1}))).reason,
            Some(DenyReason::NotALeaf)
        );
        assert!(!r.resolve(&FieldPath::root(), None).editable);
    }

    #[test]
    fn test_tries_rebuilt_only_on_change() {
        let mut r = resolver(json!({"a.[]": true}), json!({}), false);
        r.resolve(&path("a.0"), Some(&json!(1)));
        assert!(r.tries_built());

        let same = r.editable_fields().clone();
        assert!(!r.update_rules(same, NonEditableFields::new()).unwrap());
        assert!(r.tries_built());

        let changed = serde_json::from_value(json!({"b.[]": true})).unwrap();
        assert!(r.update_rules(changed, NonEditableFields::new()).unwrap());
        assert!(!r.tries_built());
        assert!(!r.resolve(&path("a.0"), Some(&json!(1))).editable);
        assert!(r.resolve(&path("b.0"), Some(&json!(1))).editable);
    }

    #[test]
    fn test_failed_update_keeps_previous_rules() {
        let mut r = resolver(json!({"a": true}), json!({}), false);
        let broken = serde_json::from_value(json!({"s": {"type": "select", "options": []}})).unwrap();
        assert!(r.update_rules(broken, NonEditableFields::new()).is_err());
        assert!(r.resolve(&path("a"), Some(&json!(1))).editable);
    }
}
