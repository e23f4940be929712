//! Events emitted by a bridge flow
//!
//! The flow never renders anything itself. Step changes, user notices and
//! resets are pushed to an unbounded channel in the order they happen.

use serde::Serialize;

use crate::state::{BridgeStep, BridgeTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A dismissable message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Why an attempt was reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Destination execution finished and the reset delay elapsed
    Completed,
    /// The relayer reported a failure for the message
    RelayerError,
    /// Requested by the caller (modal closed)
    Requested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    /// The attempt entered `step`
    StepChanged { step: BridgeStep },
    /// The lock transaction was included and is now being tracked
    TransactionRecorded { transaction: BridgeTransaction },
    Notice(Notice),
    /// A reset will follow after `after_ms`
    ResetScheduled { after_ms: u64 },
    /// The flow returned to its initial state
    Reset { reason: ResetReason },
}

impl FlowEvent {
    pub fn step(&self) -> Option<BridgeStep> {
        match self {
            FlowEvent::StepChanged { step } => Some(*step),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            FlowEvent::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = FlowEvent::StepChanged {
            step: BridgeStep::SourceConfirmed,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "step_changed");
        assert_eq!(json["step"], "source_confirmed");

        let notice = FlowEvent::Notice(Notice::success("Bridge success!"));
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["event"], "notice");
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "Bridge success!");
    }

    #[test]
    fn test_accessors() {
        let event = FlowEvent::Notice(Notice::error("nope"));
        assert!(event.notice().unwrap().is_error());
        assert_eq!(event.step(), None);
        assert_eq!(
            FlowEvent::StepChanged {
                step: BridgeStep::AwaitLock
            }
            .step(),
            Some(BridgeStep::AwaitLock)
        );
    }
}
