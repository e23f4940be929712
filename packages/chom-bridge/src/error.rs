//! Bridge flow errors
//!
//! Every variant carries the message shown to the user; the flow converts all
//! failures at the action boundary, so nothing here is fatal to the process.

use serde::Serialize;
use thiserror::Error;

/// User action that can be busy or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Approve,
    Lock,
    Track,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Approve => "approve",
            Action::Lock => "lock",
            Action::Track => "track",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Missing, malformed, or non-positive amount (UserInputError)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Chain {0} is not supported")]
    UnsupportedChain(u64),

    /// The same action is already running
    #[error("{0} is already in progress")]
    Busy(Action),

    /// The action is not available at the current step
    #[error("Cannot {action} at step {step}")]
    WrongStep { action: Action, step: u8 },

    /// Wallet or node rejected the transaction, or it reverted (TransactionSubmissionError)
    #[error("{message}")]
    Submission { action: Action, message: String },

    /// The relayer reported a failure for the bridged message (RelayerReportedError)
    #[error("Axelar Error: {0}")]
    Relayer(String),

    /// Transport-level failure talking to an external API (NetworkTransientError)
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt was reset while the action was running
    #[error("Bridge attempt was reset")]
    Superseded,

    /// The flow was disposed
    #[error("Bridge flow has been disposed")]
    Disposed,
}

impl FlowError {
    /// Failures the user can retry without resetting the flow
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            FlowError::Relayer(_) | FlowError::Superseded | FlowError::Disposed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            FlowError::Relayer("gas exhausted".into()).to_string(),
            "Axelar Error: gas exhausted"
        );
        assert_eq!(
            FlowError::WrongStep {
                action: Action::Lock,
                step: 0
            }
            .to_string(),
            "Cannot lock at step 0"
        );
        assert_eq!(
            FlowError::Busy(Action::Approve).to_string(),
            "approve is already in progress"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(FlowError::InvalidAmount("empty".into()).is_recoverable());
        assert!(FlowError::Network("timeout".into()).is_recoverable());
        assert!(!FlowError::Relayer("failed".into()).is_recoverable());
        assert!(!FlowError::Superseded.is_recoverable());
        assert!(!FlowError::Disposed.is_recoverable());
    }
}
