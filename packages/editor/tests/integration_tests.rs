//! Integration tests for editor crate

use jsonedit_editor::{
    EditingMode, EditorConfig, EditorError, EditorEvent, FieldKind, FieldPath, JsonEditor, KeyChange, LeafView,
    SubmitType,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn path(text: &str) -> FieldPath {
    FieldPath::parse(text).unwrap()
}

fn editor(tree: Value, config: Value) -> (JsonEditor, mpsc::UnboundedReceiver<EditorEvent>) {
    init_tracing();
    let mut config: EditorConfig = serde_json::from_value(config).unwrap();
    config.debouncing = false;
    let (tx, rx) = mpsc::unbounded_channel();
    let editor = JsonEditor::new(tree, config).unwrap().with_listener(tx);
    (editor, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<EditorEvent>) -> Vec<EditorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_age_range_blocks_then_commits() {
    let (mut editor, mut rx) = editor(
        json!({"age": 30}),
        json!({
            "editingMode": "individual",
            "isEditing": true,
            "allFieldsEditable": false,
            "editableFields": {
                "age": {"type": "number", "validations": {"minValue": 0, "maxValue": 120}}
            }
        }),
    );
    let age = path("age");

    let change = editor.on_leaf_change(&age, json!("150")).unwrap();
    assert_eq!(change.draft_value, Some(json!(150)));
    assert!(change.validation_message.is_some());
    assert!(!editor.can_submit_field(&age));
    assert!(matches!(
        editor.on_leaf_submit(&age),
        Err(EditorError::SubmitBlocked(paths)) if paths == vec![age.clone()]
    ));
    assert_eq!(editor.committed(), json!({"age": 30}));

    let change = editor.on_leaf_change(&age, json!("45")).unwrap();
    assert_eq!(change.validation_message, None);
    assert!(editor.can_submit_field(&age));

    let outcome = editor.on_leaf_submit(&age).unwrap();
    assert_eq!(outcome.committed, Some(json!(45)));
    assert_eq!(outcome.submit_type, SubmitType::Individual);
    assert_eq!(
        outcome.updated_keys.get(&age),
        Some(&KeyChange {
            before: Some(json!(30)),
            after: Some(json!(45))
        })
    );
    assert_eq!(editor.committed(), json!({"age": 45}));

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[2], EditorEvent::Submit(submit) if submit.initial_json == json!({"age": 30})));
}

#[test]
fn test_wildcard_rule_with_exact_deny() {
    let (editor, _rx) = editor(
        json!({"items": [{"name": "first"}, {"name": "second"}]}),
        json!({
            "allFieldsEditable": false,
            "editableFields": {"items.[].name": true},
            "nonEditableFields": {"items.0.name": true}
        }),
    );

    let denied = editor.resolve_leaf(&path("items.0.name"), Some(&json!("first")));
    assert!(denied.denied && !denied.editable);

    let allowed = editor.resolve_leaf(&path("items.1.name"), Some(&json!("second")));
    assert!(allowed.editable);
    assert_eq!(allowed.policy.map(|p| p.kind()), Some(FieldKind::String));
}

#[test]
fn test_deny_wins_whatever_the_rule_order() {
    let tree = json!({"a": [{"b": 1}, {"b": 2}, {"b": 3}]});
    for editable_first in [true, false] {
        let rules = if editable_first {
            r#"{"editableFields": {"a.[].b": true}, "nonEditableFields": {"a.2.b": true}}"#
        } else {
            r#"{"nonEditableFields": {"a.2.b": true}, "editableFields": {"a.[].b": true}}"#
        };
        let config = EditorConfig::from_json(rules).unwrap().with_all_fields_editable(false);
        let editor = JsonEditor::new(tree.clone(), config).unwrap();
        assert!(editor.resolve_leaf(&path("a.2.b"), Some(&json!(3))).denied);
        assert!(editor.resolve_leaf(&path("a.1.b"), Some(&json!(2))).editable);
    }
}

#[test]
fn test_reset_restores_committed_and_clears_message() {
    let (mut editor, mut rx) = editor(
        json!({"code": "AB"}),
        json!({
            "editingMode": "global",
            "isEditing": true,
            "editableFields": {
                "code": {"type": "string", "validations": {"regex": "^[A-Z]+$", "regexValidationMessage": "Upper case only"}}
            }
        }),
    );
    let code = path("code");

    let change = editor.on_leaf_change(&code, json!("ab")).unwrap();
    assert_eq!(change.validation_message.as_deref(), Some("Upper case only"));
    assert_eq!(editor.error_count(), 1);

    assert!(editor.on_leaf_reset(&code));
    assert_eq!(editor.draft_value(&code), editor.committed_value(&code));
    assert_eq!(editor.validation_message(&code), None);
    assert_eq!(editor.error_count(), 0);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    match &events[1] {
        EditorEvent::Change(change) => assert!(change.updated_keys.is_empty()),
        other => panic!("expected change event, got {:?}", other),
    }
}

#[test]
fn test_reset_drops_appended_array_slot() {
    let (mut editor, mut rx) = editor(
        json!({"list": [1, 2]}),
        json!({"editingMode": "global", "isEditing": true}),
    );
    let appended = path("list.2");

    let change = editor.on_leaf_change(&appended, json!("3")).unwrap();
    assert!(change.applied);
    assert_eq!(editor.draft(), json!({"list": [1, 2, "3"]}));

    assert!(editor.on_leaf_reset(&appended));
    assert_eq!(editor.draft_value(&appended), None);
    assert_eq!(editor.draft(), editor.committed());
    assert!(editor.pending_changes().is_empty());

    let outcome = editor.on_document_submit().unwrap();
    assert!(outcome.updated_keys.is_empty());
    assert_eq!(editor.committed(), json!({"list": [1, 2]}));
    assert_eq!(drain(&mut rx).len(), 2);
}

#[test]
fn test_new_rules_check_existing_edits() {
    let (mut editor, _rx) = editor(json!({"age": 30}), json!({"editingMode": "global", "isEditing": true}));
    let age = path("age");

    let change = editor.on_leaf_change(&age, json!("150")).unwrap();
    assert_eq!(change.validation_message, None);
    assert!(editor.can_submit_document());

    let rules = serde_json::from_value(json!({
        "age": {"type": "number", "validations": {"maxValue": 120}}
    }))
    .unwrap();
    assert!(editor.set_rules(rules, Default::default()).unwrap());
    assert_eq!(editor.validation_message(&age), Some("Must be at most 120"));
    assert!(!editor.can_submit_document());
    assert!(matches!(
        editor.on_document_submit(),
        Err(EditorError::SubmitBlocked(paths)) if paths == vec![age.clone()]
    ));
    assert_eq!(editor.committed(), json!({"age": 30}));
}

#[test]
fn test_policy_toggles_check_existing_edits() {
    let (mut editor, _rx) = editor(
        json!({"count": 3}),
        json!({"editingMode": "global", "isEditing": true, "enableTypeBasedRendering": false}),
    );
    let count = path("count");

    editor.on_leaf_change(&count, json!("many")).unwrap();
    assert_eq!(editor.validation_message(&count), None);

    editor.set_type_based_rendering(true);
    assert_eq!(editor.validation_message(&count), Some("Must be a number"));

    editor.set_all_fields_editable(false);
    assert_eq!(editor.validation_message(&count), None);
    assert!(editor.can_submit_document());
}

#[test]
fn test_change_event_carries_all_pending_keys() {
    let (mut editor, mut rx) = editor(
        json!({"a": 1, "b": "x"}),
        json!({"editingMode": "global", "isEditing": true}),
    );
    editor.on_leaf_change(&path("a"), json!("2")).unwrap();
    editor.on_leaf_change(&path("b"), json!("y")).unwrap();

    let events = drain(&mut rx);
    let EditorEvent::Change(last) = events.last().unwrap() else {
        panic!("expected change event");
    };
    assert_eq!(last.initial_json, json!({"a": 1, "b": "x"}));
    assert_eq!(last.updated_json, json!({"a": 2, "b": "y"}));
    assert_eq!(last.updated_keys.len(), 2);
    assert_eq!(last.editor_mode, EditingMode::Global);
}

#[test]
fn test_type_based_rendering_toggle() {
    let (mut editor, _rx) = editor(
        json!({"n": 3, "flag": true}),
        json!({"editingMode": "global", "isEditing": true}),
    );

    let kind = |view: LeafView| match view {
        LeafView::Input { policy, .. } => policy.kind(),
        other => panic!("expected input, got {:?}", other),
    };
    assert_eq!(kind(editor.leaf_view(&path("n"))), FieldKind::Number);
    assert_eq!(kind(editor.leaf_view(&path("flag"))), FieldKind::Boolean);

    editor.set_type_based_rendering(false);
    assert_eq!(kind(editor.leaf_view(&path("n"))), FieldKind::String);
}

#[test]
fn test_select_and_date_fields() -> anyhow::Result<()> {
    let (mut editor, _rx) = editor(
        json!({"theme": "dark", "due": "01/02/2024"}),
        json!({
            "editingMode": "individual",
            "isEditing": true,
            "editableFields": {
                "theme": {"type": "select", "options": [{"key": "dark", "value": "Dark"}, {"key": "light", "value": "Light"}]},
                "due": {"type": "date", "format": "DD/MM/YYYY", "maxDate": "31/12/2024"}
            }
        }),
    );

    let change = editor.on_leaf_change(&path("theme"), json!("neon"))?;
    assert_eq!(change.validation_message.as_deref(), Some("Must be one of: dark, light"));
    let change = editor.on_leaf_change(&path("theme"), json!("light"))?;
    assert_eq!(change.validation_message, None);

    let change = editor.on_leaf_change(&path("due"), json!("01/02/2025"))?;
    assert_eq!(change.validation_message.as_deref(), Some("Must be on or before 31/12/2024"));
    let change = editor.on_leaf_change(&path("due"), json!("2024-02-01"))?;
    assert_eq!(change.validation_message.as_deref(), Some("Must be a date in DD/MM/YYYY format"));
    Ok(())
}

#[test]
fn test_set_tree_replaces_only_on_difference() {
    let (mut editor, _rx) = editor(json!({"a": 1}), json!({"editingMode": "global", "isEditing": true}));
    editor.on_leaf_change(&path("a"), json!("2")).unwrap();

    assert!(!editor.set_tree(json!({"a": 1})));
    assert_eq!(editor.draft(), json!({"a": 2}));

    assert!(editor.set_tree(json!({"a": 5})));
    assert_eq!(editor.committed(), json!({"a": 5}));
    assert_eq!(editor.draft(), json!({"a": 5}));
    assert!(editor.pending_changes().is_empty());
}

#[test]
fn test_set_rules_recompiles_only_on_change() {
    let (mut editor, _rx) = editor(
        json!({"a": 1}),
        json!({"editableFields": {"a": true}, "allFieldsEditable": false}),
    );
    let same = serde_json::from_value(json!({"a": true})).unwrap();
    assert!(!editor.set_rules(same, Default::default()).unwrap());

    let broken = serde_json::from_value(json!({"a": {"type": "radio", "options": []}})).unwrap();
    assert!(matches!(
        editor.set_rules(broken, Default::default()),
        Err(EditorError::Config(_))
    ));
    assert!(editor.resolve_leaf(&path("a"), Some(&json!(1))).editable);

    let denied = serde_json::from_value(json!({"a": true})).unwrap();
    assert!(editor.set_rules(Default::default(), denied).unwrap());
    assert!(editor.resolve_leaf(&path("a"), Some(&json!(1))).denied);
}

#[test]
fn test_returned_trees_are_copies() {
    let (editor, _rx) = editor(json!({"a": {"b": 1}}), json!({}));
    let mut copy = editor.committed();
    copy["a"]["b"] = json!(99);
    assert_eq!(editor.committed(), json!({"a": {"b": 1}}));
}

#[test]
fn test_version_tracks_mutations() {
    let (mut editor, _rx) = editor(json!({"a": 1}), json!({"editingMode": "individual", "isEditing": true}));
    assert_eq!(editor.version(), 0);
    editor.on_leaf_change(&path("a"), json!("2")).unwrap();
    assert_eq!(editor.version(), 1);
    editor.on_leaf_submit(&path("a")).unwrap();
    assert_eq!(editor.version(), 2);
}
