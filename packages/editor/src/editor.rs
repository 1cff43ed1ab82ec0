//! # JSON Editor Engine
//!
//! Owns every piece of editing state for one document and exposes the
//! operations a renderer calls:
//!
//! ```text
//!  renderer ──leaf_view──────────► Resolver + mode + selection
//!           ──on_leaf_change─────► coerce ─► draft ─► Debouncer ─┐
//!                                                                ▼
//!                                            validate + ChangeEvent
//!           ──on_leaf_submit─────► commit_field ─► SubmitEvent
//!           ──on_document_submit─► commit_all ───► SubmitEvent
//! ```
//!
//! The engine is single-threaded. Debounced work is delivered back through
//! [`JsonEditor::next_debounced`], [`JsonEditor::settle`],
//! [`JsonEditor::poll_debounced`] or [`JsonEditor::flush_debounced`]; with
//! debouncing off every change is validated and reported before
//! `on_leaf_change` returns.

use std::collections::BTreeSet;
use std::time::Duration;

use jsonedit_path::FieldPath;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::diff::UpdatedKeys;
use crate::errors::EditorError;
use crate::events::{ChangeEvent, EditorListener, NoopListener, SubmitEvent};
use crate::mode::{Controls, EditingMode, InlineSelection, LeafView, SubmitType};
use crate::resolver::{Resolution, Resolver};
use crate::rules::{EditableFields, NonEditableFields};
use crate::store::SnapshotStore;
use crate::validation::{validate, ValidationErrors};

/// Result of feeding one widget value into the draft
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafChange {
    /// Draft value after coercion
    pub draft_value: Option<Value>,
    /// Current message for the path; stale while `pending` is set
    pub validation_message: Option<String>,
    /// Validation and the change event wait for the debounce window
    pub pending: bool,
    /// `false` when the path's parent no longer exists in the draft
    pub applied: bool,
}

/// Result of a field or document commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Committed value of the field, or the whole committed tree
    pub committed: Option<Value>,
    /// Leaves changed by this commit; empty when there was nothing to commit
    pub updated_keys: UpdatedKeys,
    pub submit_type: SubmitType,
}

pub struct JsonEditor {
    store: SnapshotStore,
    resolver: Resolver,
    mode: EditingMode,
    editing: bool,
    selection: InlineSelection,
    errors: ValidationErrors,
    debouncer: Debouncer,
    listener: Box<dyn EditorListener>,
}

impl JsonEditor {
    /// Create an editor for `tree`.
    ///
    /// Fails on the first malformed rule in `config`.
    pub fn new(tree: Value, config: EditorConfig) -> Result<Self, EditorError> {
        let resolver = Resolver::new(
            config.editable_fields.clone(),
            config.non_editable_fields.clone(),
            config.all_fields_editable,
            config.enable_type_based_rendering,
        )?;

        info!(
            mode = %config.mode,
            debounce_ms = config.debounce_delay().as_millis() as u64,
            "Editor created"
        );

        Ok(Self {
            store: SnapshotStore::new(tree),
            resolver,
            mode: config.mode,
            editing: config.is_editing,
            selection: InlineSelection::default(),
            errors: ValidationErrors::new(),
            debouncer: Debouncer::new(config.debounce_delay()),
            listener: Box::new(NoopListener),
        })
    }

    pub fn with_listener(mut self, listener: impl EditorListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn set_listener(&mut self, listener: impl EditorListener + 'static) {
        self.listener = Box::new(listener);
    }

    /// Replace both snapshots if `tree` differs from the last tree supplied.
    ///
    /// Pending updates, validation messages and inline selections are
    /// dropped along with the old tree.
    #[instrument(skip(self, tree))]
    pub fn set_tree(&mut self, tree: Value) -> bool {
        if !self.store.replace_if_changed(tree) {
            return false;
        }
        self.debouncer.cancel_all();
        self.errors.clear();
        self.selection.clear();
        info!(version = self.store.version(), "Tree replaced");
        true
    }

    /// Replace the rule maps; a no-op when both are unchanged.
    ///
    /// Edited paths and paths holding a validation message are re-checked
    /// under the new rules.
    #[instrument(skip_all)]
    pub fn set_rules(
        &mut self,
        editable_fields: EditableFields,
        non_editable_fields: NonEditableFields,
    ) -> Result<bool, EditorError> {
        if !self.resolver.update_rules(editable_fields, non_editable_fields)? {
            return Ok(false);
        }
        self.revalidate_settled();
        Ok(true)
    }

    /// Switch protocol; pending updates are cancelled and selections dropped
    #[instrument(skip(self))]
    pub fn set_mode(&mut self, mode: EditingMode) {
        if mode == self.mode {
            return;
        }
        self.cancel_pending();
        self.selection.clear();
        self.mode = mode;
        info!(mode = %mode, "Editing mode changed");
    }

    /// Turn the document-level editing flag on or off.
    ///
    /// Turning it off leaves both snapshots untouched; pending updates are
    /// cancelled.
    #[instrument(skip(self))]
    pub fn set_editing(&mut self, editing: bool) {
        if editing == self.editing {
            return;
        }
        if !editing {
            self.cancel_pending();
        }
        self.editing = editing;
        debug!(editing, "Editing flag changed");
    }

    pub fn set_all_fields_editable(&mut self, enabled: bool) {
        self.resolver.set_all_fields_editable(enabled);
        self.revalidate_settled();
    }

    pub fn set_type_based_rendering(&mut self, enabled: bool) {
        self.resolver.set_type_based_rendering(enabled);
        self.revalidate_settled();
    }

    /// Change the debounce delay; zero makes changes synchronous
    pub fn set_debounce_delay(&mut self, delay: Duration) {
        if delay.is_zero() {
            for path in self.debouncer.flush() {
                self.process_due(&path);
            }
        }
        self.debouncer.set_delay(delay);
    }

    pub fn mode(&self) -> EditingMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Copy of the committed tree
    pub fn committed(&self) -> Value {
        self.store.committed().clone()
    }

    /// Copy of the draft tree
    pub fn draft(&self) -> Value {
        self.store.draft().clone()
    }

    pub fn committed_value(&self, path: &FieldPath) -> Option<Value> {
        self.store.committed_value(path).cloned()
    }

    pub fn draft_value(&self, path: &FieldPath) -> Option<Value> {
        self.store.draft_value(path).cloned()
    }

    pub fn pending_changes(&self) -> UpdatedKeys {
        self.store.pending_changes()
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn validation_message(&self, path: &FieldPath) -> Option<&str> {
        self.errors.message(path)
    }

    pub fn validation_errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.count()
    }

    /// Paths with a change still inside its debounce window
    pub fn pending_updates(&self) -> usize {
        self.debouncer.pending_count()
    }

    pub fn is_selected(&self, path: &FieldPath) -> bool {
        self.selection.is_selected(path)
    }

    /// Resolve `path` whose current value is `current`
    pub fn resolve_leaf(&self, path: &FieldPath, current: Option<&Value>) -> Resolution {
        self.resolver.resolve(path, current)
    }

    /// Resolve `path` against its committed value (draft value if new)
    fn resolution(&self, path: &FieldPath) -> Resolution {
        let current = self
            .store
            .committed_value(path)
            .or_else(|| self.store.draft_value(path));
        self.resolver.resolve(path, current)
    }

    fn input_shown(&self, path: &FieldPath, resolution: &Resolution) -> bool {
        resolution.editable
            && match self.mode {
                EditingMode::Inline => self.selection.is_selected(path),
                _ => self.editing,
            }
    }

    /// Resolution for an input that is currently shown, or the refusal
    fn shown_resolution(&self, path: &FieldPath) -> Result<Resolution, EditorError> {
        let resolution = self.resolution(path);
        if !resolution.editable {
            return Err(EditorError::NotEditable(path.clone()));
        }
        if !self.input_shown(path, &resolution) {
            return Err(EditorError::InputNotShown(path.clone()));
        }
        Ok(resolution)
    }

    /// What the renderer should draw for `path`
    pub fn leaf_view(&self, path: &FieldPath) -> LeafView {
        let resolution = self.resolution(path);
        let read_mode_value = self.committed_value(path);

        let policy = match &resolution.policy {
            Some(policy) if self.input_shown(path, &resolution) => policy.clone(),
            _ => {
                return LeafView::ReadOnly {
                    value: read_mode_value.or_else(|| self.draft_value(path)),
                    can_edit_inline: self.mode == EditingMode::Inline && resolution.editable,
                }
            }
        };

        let value = match self.store.draft_value(path) {
            None | Some(Value::Null) => Value::String(String::new()),
            Some(value) => value.clone(),
        };

        LeafView::Input {
            policy,
            value,
            read_mode_value,
            validation_message: self.errors.message(path).map(str::to_string),
            controls: Controls {
                submit: self.mode.allows_field_submit(),
                submit_enabled: self.can_submit_field(path),
                cancel: self.mode.shows_cancel(),
                reset: self.mode.shows_reset(),
            },
        }
    }

    /// Whether the per-field submit for `path` is shown and enabled
    pub fn can_submit_field(&self, path: &FieldPath) -> bool {
        self.mode.allows_field_submit()
            && self.input_shown(path, &self.resolution(path))
            && !self.errors.has_error(path)
            && self.store.is_field_dirty(path)
    }

    /// Whether the document-level submit is shown and enabled
    pub fn can_submit_document(&self) -> bool {
        self.mode.allows_document_submit() && self.editing && self.errors.is_empty()
    }

    /// Show the input for `path` (inline mode's edit affordance)
    #[instrument(skip_all, fields(path = %path))]
    pub fn begin_inline_edit(&mut self, path: &FieldPath) -> Result<(), EditorError> {
        if self.mode != EditingMode::Inline {
            return Err(EditorError::NotAllowedInMode {
                action: "Inline edit",
                mode: self.mode,
            });
        }
        if !self.resolution(path).editable {
            return Err(EditorError::NotEditable(path.clone()));
        }
        self.selection.select(path);
        Ok(())
    }

    /// Discard the draft edit for `path` and return it to read mode
    #[instrument(skip_all, fields(path = %path))]
    pub fn cancel_inline_edit(&mut self, path: &FieldPath) -> Result<(), EditorError> {
        if self.mode != EditingMode::Inline {
            return Err(EditorError::NotAllowedInMode {
                action: "Inline cancel",
                mode: self.mode,
            });
        }
        self.on_leaf_reset(path);
        self.selection.deselect(path);
        Ok(())
    }

    /// Feed a widget value for `path` into the draft.
    ///
    /// The draft reflects the value at once. Validation and the change
    /// event follow after the debounce window, or immediately when
    /// debouncing is off.
    #[instrument(skip_all, fields(path = %path))]
    pub fn on_leaf_change(&mut self, path: &FieldPath, raw: Value) -> Result<LeafChange, EditorError> {
        let resolution = self.shown_resolution(path)?;
        let value = match &resolution.policy {
            Some(policy) => policy.coerce(raw),
            None => raw,
        };

        if !self.store.apply_change(path, value) {
            return Ok(LeafChange {
                draft_value: self.draft_value(path),
                validation_message: self.errors.message(path).map(str::to_string),
                pending: self.debouncer.is_pending(path),
                applied: false,
            });
        }

        let pending = if self.debouncer.is_immediate() {
            self.process_due(path);
            false
        } else {
            self.debouncer.schedule(path);
            true
        };

        Ok(LeafChange {
            draft_value: self.draft_value(path),
            validation_message: self.errors.message(path).map(str::to_string),
            pending,
            applied: true,
        })
    }

    /// Commit the draft value of `path` alone.
    ///
    /// Not available in `global` mode. Refused while the field holds a
    /// validation message. Committing an unchanged field succeeds with an
    /// empty diff and emits nothing.
    #[instrument(skip_all, fields(path = %path))]
    pub fn on_leaf_submit(&mut self, path: &FieldPath) -> Result<SubmitOutcome, EditorError> {
        if !self.mode.allows_field_submit() {
            return Err(EditorError::NotAllowedInMode {
                action: "Field submit",
                mode: self.mode,
            });
        }
        self.shown_resolution(path)?;

        if self.debouncer.cancel(path) {
            self.process_due(path);
        }
        if self.errors.has_error(path) {
            return Err(EditorError::SubmitBlocked(vec![path.clone()]));
        }

        let initial = self.store.committed().clone();
        let updated_keys = self
            .store
            .commit_field(path)
            .ok_or_else(|| EditorError::MissingLeaf(path.clone()))?;
        let submit_type = self.mode.field_submit_type();

        if self.mode == EditingMode::Inline {
            self.selection.deselect(path);
        }

        if !updated_keys.is_empty() {
            info!(changed = updated_keys.len(), submit_type = ?submit_type, "Field submitted");
            self.listener.on_submit(&SubmitEvent {
                initial_json: initial,
                updated_json: self.store.committed().clone(),
                updated_keys: updated_keys.clone(),
                editor_mode: self.mode,
                submit_type,
            });
        }

        Ok(SubmitOutcome {
            committed: self.committed_value(path),
            updated_keys,
            submit_type,
        })
    }

    /// Restore the committed value of `path` into the draft.
    ///
    /// Cancels any pending update for the path and clears its message.
    /// Resetting an appended array slot also drops the slots after it.
    /// Returns whether the draft changed.
    #[instrument(skip_all, fields(path = %path))]
    pub fn on_leaf_reset(&mut self, path: &FieldPath) -> bool {
        self.debouncer.cancel(path);
        self.errors.clear_path(path);
        let changed = self.store.reset_field(path);
        if changed {
            self.revalidate_settled();
            self.emit_change();
        }
        changed
    }

    /// Commit the whole draft.
    ///
    /// Only in `global` and `global-individual` mode with editing on.
    /// Pending updates are flushed first; any validation message blocks the
    /// commit and the error names every offending path.
    #[instrument(skip(self))]
    pub fn on_document_submit(&mut self) -> Result<SubmitOutcome, EditorError> {
        if !self.mode.allows_document_submit() {
            return Err(EditorError::NotAllowedInMode {
                action: "Document submit",
                mode: self.mode,
            });
        }
        if !self.editing {
            return Err(EditorError::NotEditing);
        }

        self.flush_debounced();
        if !self.errors.is_empty() {
            return Err(EditorError::SubmitBlocked(self.errors.paths()));
        }

        let initial = self.store.committed().clone();
        let updated_keys = self.store.commit_all();
        if !updated_keys.is_empty() {
            info!(changed = updated_keys.len(), "Document submitted");
            self.listener.on_submit(&SubmitEvent {
                initial_json: initial,
                updated_json: self.store.committed().clone(),
                updated_keys: updated_keys.clone(),
                editor_mode: self.mode,
                submit_type: SubmitType::Global,
            });
        }

        Ok(SubmitOutcome {
            committed: Some(self.committed()),
            updated_keys,
            submit_type: SubmitType::Global,
        })
    }

    /// Wait for the next debounce window to close and process it.
    ///
    /// Returns `None` once nothing is pending.
    pub async fn next_debounced(&mut self) -> Option<FieldPath> {
        let path = self.debouncer.next_due().await?;
        self.process_due(&path);
        Some(path)
    }

    /// Process debounced updates until none is pending
    pub async fn settle(&mut self) -> usize {
        let mut processed = 0;
        while self.next_debounced().await.is_some() {
            processed += 1;
        }
        processed
    }

    /// Process updates whose window already closed, without waiting
    pub fn poll_debounced(&mut self) -> Vec<FieldPath> {
        let due = self.debouncer.take_due();
        for path in &due {
            self.process_due(path);
        }
        due
    }

    /// Process every pending update now, in edit order
    pub fn flush_debounced(&mut self) -> Vec<FieldPath> {
        let due = self.debouncer.flush();
        for path in &due {
            self.process_due(path);
        }
        due
    }

    /// Validate the draft value at `path` and report the change
    fn process_due(&mut self, path: &FieldPath) {
        self.revalidate(path);
        self.emit_change();
    }

    /// Recompute the message for `path` from its current draft value
    fn revalidate(&mut self, path: &FieldPath) {
        let resolution = self.resolution(path);
        let outcome = match &resolution.policy {
            Some(policy) if resolution.editable => validate(self.store.draft_value(path), policy),
            _ => None,
        };
        debug!(path = %path, valid = outcome.is_none(), "Validated");
        self.errors.record(path, outcome);
    }

    /// Re-check every edited or failing path whose timer already fired.
    ///
    /// Paths still waiting on a timer are validated when it fires.
    fn revalidate_settled(&mut self) {
        let mut paths: BTreeSet<FieldPath> = self.store.pending_changes().into_keys().collect();
        paths.extend(self.errors.paths());
        for path in paths {
            if !self.debouncer.is_pending(&path) {
                self.revalidate(&path);
            }
        }
    }

    /// Stop every timer; the affected paths are validated but not reported
    fn cancel_pending(&mut self) {
        for path in self.debouncer.flush() {
            self.revalidate(&path);
        }
    }

    fn emit_change(&mut self) {
        let event = ChangeEvent {
            initial_json: self.store.committed().clone(),
            updated_json: self.store.draft().clone(),
            updated_keys: self.store.pending_changes(),
            editor_mode: self.mode,
        };
        self.listener.on_change(&event);
    }
}
