//! Bridge attempt state
//!
//! The step counter only moves forward within one attempt; a reset starts a
//! new attempt from [`BridgeStep::AwaitApproval`].

use std::fmt;

use alloy::primitives::TxHash;
use serde::Serialize;

/// Progress of a bridge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStep {
    /// Waiting for the user to approve the allowance
    AwaitApproval = 0,
    /// Allowance mined; waiting for the lock transaction
    AwaitLock = 1,
    /// Lock mined; relayer has the message
    RelaySubmitted = 2,
    /// Validators confirmed the source gateway call
    SourceConfirmed = 3,
    /// Message approved on the destination gateway
    DestApproved = 4,
    /// Unlock executed on the destination chain
    DestExecuted = 5,
}

impl BridgeStep {
    pub const ALL: [BridgeStep; 6] = [
        BridgeStep::AwaitApproval,
        BridgeStep::AwaitLock,
        BridgeStep::RelaySubmitted,
        BridgeStep::SourceConfirmed,
        BridgeStep::DestApproved,
        BridgeStep::DestExecuted,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Step title shown in the progress list
    pub fn title(&self) -> &'static str {
        match self {
            BridgeStep::AwaitApproval => "Approve CHOM",
            BridgeStep::AwaitLock => "Lock CHOM",
            BridgeStep::RelaySubmitted => "Processing by Axelar",
            BridgeStep::SourceConfirmed => "Approving on Destination chain",
            BridgeStep::DestApproved => "Unlocking CHOM on Destination chain",
            BridgeStep::DestExecuted => "Bridge complete",
        }
    }

    /// Relayer status is polled while the attempt sits in steps 2..5
    pub fn is_polling(&self) -> bool {
        matches!(
            self,
            BridgeStep::RelaySubmitted | BridgeStep::SourceConfirmed | BridgeStep::DestApproved
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == BridgeStep::DestExecuted
    }
}

impl fmt::Display for BridgeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.title())
    }
}

/// The lock transaction of an attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeTransaction {
    /// Client-side random nonce in `[0, 10^15)`; informational only
    pub nonce: u64,
    pub lock_tx_hash: TxHash,
    /// Axelarscan page for the GMP call
    pub explorer_url: String,
}

/// Everything the flow knows about the current attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeState {
    pub step: BridgeStep,
    pub approving: bool,
    pub locking: bool,
    pub transaction: Option<BridgeTransaction>,
    /// Incremented by every reset; results tagged with an older attempt are stale
    pub attempt: u64,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BridgeState {
    pub fn new(attempt: u64) -> Self {
        Self {
            step: BridgeStep::AwaitApproval,
            approving: false,
            locking: false,
            transaction: None,
            attempt,
        }
    }

    /// Move forward to `target`, returning every step entered on the way.
    ///
    /// Returns an empty list when `target` is not ahead of the current step.
    pub fn advance_to(&mut self, target: BridgeStep) -> Vec<BridgeStep> {
        if target <= self.step {
            return Vec::new();
        }
        let entered: Vec<BridgeStep> = BridgeStep::ALL
            .iter()
            .copied()
            .filter(|s| *s > self.step && *s <= target)
            .collect();
        self.step = target;
        entered
    }

    /// Initial state of the next attempt
    pub fn next_attempt(&self) -> Self {
        Self::new(self.attempt + 1)
    }
}
