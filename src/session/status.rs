//! Edit lifecycle status.

use serde::Serialize;
use std::fmt;

/// Status message shown while an edit is running.
pub const IN_PROGRESS_MESSAGE: &str = "Applying AI magic...";

/// Session-wide edit lifecycle state. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Nothing running, no error to show.
    #[default]
    Idle,
    /// An edit request is outstanding.
    InProgress(String),
    /// The last edit failed.
    Failed(String),
}

impl ProcessingStatus {
    /// Returns true when no edit is running and no error is shown.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true while an edit request is outstanding.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }

    /// Returns the error message if the last edit failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::InProgress(message) => write!(f, "working: {message}"),
            Self::Failed(message) => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(ProcessingStatus::default().is_idle());
        assert!(ProcessingStatus::InProgress(IN_PROGRESS_MESSAGE.into()).is_in_progress());
        assert_eq!(ProcessingStatus::Failed("boom".into()).error(), Some("boom"));
        assert_eq!(ProcessingStatus::Idle.error(), None);
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(ProcessingStatus::Failed("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "message": "boom"}));

        let json = serde_json::to_value(ProcessingStatus::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"state": "idle"}));
    }
}
