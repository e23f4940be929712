//! Relayer status poller
//!
//! One task per tracked lock transaction. The loop sleeps, awaits a single
//! status check, and only then arms the next sleep, so checks never overlap
//! however long the relayer takes to answer.
//!
//! The task holds a `Weak` reference to its tracker and exits when the tracker
//! is dropped, when its cancellation token fires, or when a check reports that
//! tracking is over.

use std::sync::Weak;
use std::time::Duration;

use alloy::primitives::TxHash;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FlowError;
use crate::retry::RetryConfig;
use crate::state::BridgeStep;

/// Identity of a tracked transaction within one bridge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollKey {
    pub tx_hash: TxHash,
    pub attempt: u64,
}

/// Result of one status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Nothing new; the attempt is still at this step
    Unchanged(BridgeStep),
    /// The attempt moved forward to this step
    Advanced(BridgeStep),
    /// Destination execution observed; tracking is done
    Completed,
    /// The key no longer matches the current attempt
    Stale,
}

impl TrackOutcome {
    /// Whether the poller should stop after this outcome
    pub fn is_final(&self) -> bool {
        matches!(self, TrackOutcome::Completed | TrackOutcome::Stale)
    }
}

/// Something that can check relayer status for a key
#[async_trait]
pub trait StatusTracker: Send + Sync + 'static {
    async fn track(&self, key: PollKey) -> Result<TrackOutcome, FlowError>;
}

/// Polling cadence
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub retry: RetryConfig,
}

impl PollerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            retry: RetryConfig::for_poll_interval(interval),
        }
    }
}

/// Spawn the polling loop for `key`.
pub fn spawn<T: StatusTracker>(
    tracker: Weak<T>,
    key: PollKey,
    token: CancellationToken,
    config: PollerConfig,
) -> JoinHandle<()> {
    tokio::spawn(run(tracker, key, token, config))
}

async fn run<T: StatusTracker>(
    tracker: Weak<T>,
    key: PollKey,
    token: CancellationToken,
    config: PollerConfig,
) {
    info!(
        tx_hash = %key.tx_hash,
        attempt = key.attempt,
        interval_ms = config.interval.as_millis() as u64,
        "Status poller started"
    );

    let mut failures: u32 = 0;
    let mut delay = config.interval;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let Some(tracker) = tracker.upgrade() else {
            debug!(tx_hash = %key.tx_hash, "Tracker dropped");
            break;
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => break,
            outcome = tracker.track(key) => outcome,
        };
        drop(tracker);

        match outcome {
            Ok(outcome) if outcome.is_final() => {
                debug!(tx_hash = %key.tx_hash, outcome = ?outcome, "Tracking finished");
                break;
            }
            Ok(outcome) => {
                debug!(tx_hash = %key.tx_hash, outcome = ?outcome, "Status checked");
                failures = 0;
                delay = config.interval;
            }
            Err(FlowError::Network(e)) => {
                delay = config.retry.backoff_for_attempt(failures);
                failures = failures.saturating_add(1);
                warn!(
                    tx_hash = %key.tx_hash,
                    error = %e,
                    consecutive_failures = failures,
                    retry_in_ms = delay.as_millis() as u64,
                    "Status poll failed, backing off"
                );
            }
            Err(e) => {
                debug!(tx_hash = %key.tx_hash, error = %e, "Status poller stopping");
                break;
            }
        }
    }

    info!(tx_hash = %key.tx_hash, attempt = key.attempt, "Status poller stopped");
}
