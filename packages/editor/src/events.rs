//! Notifications sent to the host on every accepted change and commit

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::diff::UpdatedKeys;
use crate::mode::{EditingMode, SubmitType};

/// A draft change that made it through the debounce window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Committed tree
    pub initial_json: Value,
    /// Draft tree
    pub updated_json: Value,
    /// Leaves that differ between the two
    pub updated_keys: UpdatedKeys,
    pub editor_mode: EditingMode,
}

/// A commit of one field or of the whole draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvent {
    /// Committed tree before the commit
    pub initial_json: Value,
    /// Committed tree after the commit
    pub updated_json: Value,
    /// Leaves changed by this commit
    pub updated_keys: UpdatedKeys,
    pub editor_mode: EditingMode,
    pub submit_type: SubmitType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EditorEvent {
    Change(ChangeEvent),
    Submit(SubmitEvent),
}

/// Receives editor notifications.
///
/// Both methods default to doing nothing.
pub trait EditorListener {
    fn on_change(&mut self, _event: &ChangeEvent) {}

    fn on_submit(&mut self, _event: &SubmitEvent) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl EditorListener for NoopListener {}

impl<F> EditorListener for F
where
    F: FnMut(&EditorEvent),
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(&EditorEvent::Change(event.clone()));
    }

    fn on_submit(&mut self, event: &SubmitEvent) {
        self(&EditorEvent::Submit(event.clone()));
    }
}

impl EditorListener for mpsc::UnboundedSender<EditorEvent> {
    fn on_change(&mut self, event: &ChangeEvent) {
        if self.send(EditorEvent::Change(event.clone())).is_err() {
            tracing::debug!("Event receiver dropped, change not delivered");
        }
    }

    fn on_submit(&mut self, event: &SubmitEvent) {
        if self.send(EditorEvent::Submit(event.clone())).is_err() {
            tracing::debug!("Event receiver dropped, submit not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use serde_json::json;

    fn change() -> ChangeEvent {
        let initial = json!({"age": 30});
        let updated = json!({"age": 45});
        ChangeEvent {
            updated_keys: diff(&initial, &updated),
            initial_json: initial,
            updated_json: updated,
            editor_mode: EditingMode::Global,
        }
    }

    #[test]
    fn test_event_json_shape() {
        let event = SubmitEvent {
            initial_json: json!({"age": 30}),
            updated_json: json!({"age": 45}),
            updated_keys: change().updated_keys,
            editor_mode: EditingMode::GlobalIndividual,
            submit_type: SubmitType::Global,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "initialJson": {"age": 30},
                "updatedJson": {"age": 45},
                "updatedKeys": {"age": {"before": 30, "after": 45}},
                "editorMode": "global-individual",
                "submitType": "global"
            })
        );
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut listener = |event: &EditorEvent| seen.push(event.clone());
            listener.on_change(&change());
        }
        assert!(matches!(seen.as_slice(), [EditorEvent::Change(_)]));
    }

    #[test]
    fn test_channel_listener() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.on_change(&change());
        assert!(matches!(rx.try_recv(), Ok(EditorEvent::Change(_))));

        drop(rx);
        tx.on_change(&change());
    }
}
