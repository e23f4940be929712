//! Bridge flow controller
//!
//! Drives one bridge attempt through approve → lock → relay-confirm →
//! relay-approve → relay-execute.
//!
//! # Steps
//!
//! | Step | Entered when | Leaves via |
//! |------|--------------|------------|
//! | 0 `AwaitApproval` | flow created or reset | [`BridgeFlow::approve`] |
//! | 1 `AwaitLock` | approval included | [`BridgeFlow::lock`] |
//! | 2 `RelaySubmitted` | lock included | status poll |
//! | 3 `SourceConfirmed` | relayer confirmed the source call | status poll |
//! | 4 `DestApproved` | relayer approved on destination | status poll |
//! | 5 `DestExecuted` | relayer executed on destination | reset after delay |
//!
//! The step never moves backward within an attempt. User actions fail fast when
//! invoked at the wrong step or while already running. All failures are turned
//! into a single error notice at the action boundary and returned as
//! [`FlowError`].
//!
//! # Tasks
//!
//! Entering step 2 spawns a status poller keyed by the lock transaction and
//! attempt. Entering step 5 stops it and arms a reset timer. Both use child
//! tokens of the flow's own [`CancellationToken`], so [`BridgeFlow::dispose`]
//! (or dropping the last handle) stops everything. Results that arrive for an
//! attempt that has since been reset are discarded.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use eyre::{Result as EyreResult, WrapErr};
use gmp_client::clients::{ChainWriter, FeeEstimator, GmpStatusSource};
use gmp_client::types::GmpStatusResponse;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::amount::BridgeAmount;
use crate::chains::ChainPair;
use crate::error::{Action, FlowError};
use crate::events::{FlowEvent, Notice, ResetReason};
use crate::poller::{self, PollKey, PollerConfig, StatusTracker, TrackOutcome};
use crate::retry::RetryConfig;
use crate::state::{BridgeState, BridgeStep, BridgeTransaction};

/// Exclusive upper bound of the client-side lock nonce
pub const NONCE_BOUND: u64 = 1_000_000_000_000_000;

/// Gas limit quoted for the destination execution
pub const DEFAULT_GAS_LIMIT: u64 = 150_000;

/// Explicitly constructed external clients used by a flow
#[derive(Clone)]
pub struct BridgeClients {
    pub chain: Arc<dyn ChainWriter>,
    pub fees: Arc<dyn FeeEstimator>,
    pub status: Arc<dyn GmpStatusSource>,
}

/// Tunables of a flow
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub gas_limit: u64,
    /// Delay between relayer status checks
    pub poll_interval: Duration,
    /// Delay between destination execution and the automatic reset
    pub reset_delay: Duration,
    /// Backoff applied to failed status checks
    pub retry: RetryConfig,
    /// Axelarscan explorer base for transaction links
    pub explorer_url: Url,
}

impl Default for FlowConfig {
    fn default() -> Self {
        let poll_interval = Duration::from_millis(3000);
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval,
            reset_delay: Duration::from_millis(3000),
            retry: RetryConfig::for_poll_interval(poll_interval),
            explorer_url: gmp_client::AxelarEnvironment::Testnet.explorer_url(),
        }
    }
}

impl FlowConfig {
    /// Explorer page of a GMP call
    pub fn explorer_link(&self, tx_hash: TxHash) -> String {
        format!(
            "{}/gmp/{}",
            self.explorer_url.as_str().trim_end_matches('/'),
            tx_hash
        )
    }
}

#[derive(Default)]
struct Tasks {
    poller: Option<(PollKey, CancellationToken)>,
    reset_timer: Option<CancellationToken>,
}

impl Tasks {
    fn cancel_all(&mut self) {
        if let Some((_, token)) = self.poller.take() {
            token.cancel();
        }
        if let Some(token) = self.reset_timer.take() {
            token.cancel();
        }
    }
}

struct FlowInner {
    weak: Weak<FlowInner>,
    clients: BridgeClients,
    config: FlowConfig,
    pair: ChainPair,
    amount: BridgeAmount,
    state: Mutex<BridgeState>,
    tasks: Mutex<Tasks>,
    events: mpsc::UnboundedSender<FlowEvent>,
    shutdown: CancellationToken,
}

impl Drop for FlowInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Handle to a bridge flow; clones share the same attempt
#[derive(Clone)]
pub struct BridgeFlow {
    inner: Arc<FlowInner>,
}

impl BridgeFlow {
    /// Create a flow at step 0 and the receiver for its events.
    pub fn new(
        clients: BridgeClients,
        config: FlowConfig,
        pair: ChainPair,
        amount: BridgeAmount,
    ) -> (Self, mpsc::UnboundedReceiver<FlowEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new_cyclic(|weak| FlowInner {
            weak: weak.clone(),
            clients,
            config,
            pair,
            amount,
            state: Mutex::new(BridgeState::default()),
            tasks: Mutex::new(Tasks::default()),
            events,
            shutdown: CancellationToken::new(),
        });

        info!(
            source = inner.pair.source.display_name,
            destination = inner.pair.destination.display_name,
            amount = %inner.amount,
            "Bridge flow opened"
        );
        inner.emit(FlowEvent::StepChanged {
            step: BridgeStep::AwaitApproval,
        });

        (Self { inner }, receiver)
    }

    pub fn pair(&self) -> &ChainPair {
        &self.inner.pair
    }

    pub fn amount(&self) -> BridgeAmount {
        self.inner.amount
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> BridgeState {
        self.inner.state().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Grant the bridge contract an allowance for the amount, then lock.
    ///
    /// Returns the result of the chained [`lock`](Self::lock) once the
    /// approval is included.
    pub async fn approve(&self) -> Result<(), FlowError> {
        self.inner.approve().await?;
        self.inner.lock().await
    }

    /// Quote the relay fee and submit the lock transaction.
    pub async fn lock(&self) -> Result<(), FlowError> {
        self.inner.lock().await
    }

    /// Check relayer status once and advance the step accordingly.
    ///
    /// At step 5 this is a no-op. Before step 2 there is nothing to track.
    pub async fn track_status(&self) -> Result<TrackOutcome, FlowError> {
        let key = {
            let state = self.inner.state();
            self.inner.ensure_active()?;
            if state.step.is_terminal() {
                return Ok(TrackOutcome::Unchanged(state.step));
            }
            let tx_hash = match (&state.transaction, state.step.is_polling()) {
                (Some(tx), true) => tx.lock_tx_hash,
                _ => {
                    return Err(FlowError::WrongStep {
                        action: Action::Track,
                        step: state.step.index(),
                    })
                }
            };
            PollKey {
                tx_hash,
                attempt: state.attempt,
            }
        };
        self.inner.track(key).await
    }

    /// Return to step 0 and start a new attempt.
    pub fn reset(&self) -> Result<(), FlowError> {
        self.inner.ensure_active()?;
        self.inner.reset(ResetReason::Requested);
        Ok(())
    }

    /// Stop every task owned by the flow. Further actions fail with
    /// [`FlowError::Disposed`].
    pub fn dispose(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        info!("Bridge flow disposed");
        self.inner.tasks().cancel_all();
        self.inner.shutdown.cancel();
    }
}

impl FlowInner {
    fn state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: FlowEvent) {
        // A closed receiver only means nobody is watching
        let _ = self.events.send(event);
    }

    fn ensure_active(&self) -> Result<(), FlowError> {
        if self.shutdown.is_cancelled() {
            return Err(FlowError::Disposed);
        }
        Ok(())
    }

    /// Check preconditions for `action` and mark it busy
    fn begin(&self, action: Action, expected: BridgeStep) -> Result<u64, FlowError> {
        let mut state = self.state();
        self.ensure_active()?;

        let busy = match action {
            Action::Approve => state.approving,
            _ => state.locking,
        };
        if busy {
            return Err(FlowError::Busy(action));
        }

        if state.step != expected {
            return Err(FlowError::WrongStep {
                action,
                step: state.step.index(),
            });
        }

        match action {
            Action::Approve => state.approving = true,
            _ => state.locking = true,
        }
        Ok(state.attempt)
    }

    /// Re-acquire state after an await, rejecting results for a dead attempt
    fn resume(&self, attempt: u64) -> Result<MutexGuard<'_, BridgeState>, FlowError> {
        let state = self.state();
        self.ensure_active()?;
        if state.attempt != attempt {
            debug!(attempt = attempt, current = state.attempt, "Discarding stale result");
            return Err(FlowError::Superseded);
        }
        Ok(state)
    }

    fn advance(&self, state: &mut BridgeState, target: BridgeStep) {
        for step in state.advance_to(target) {
            info!(step = %step, attempt = state.attempt, "Bridge step entered");
            self.emit(FlowEvent::StepChanged { step });
        }
    }

    // ========================================================================
    // Approve
    // ========================================================================

    async fn approve(&self) -> Result<(), FlowError> {
        let attempt = self.begin(Action::Approve, BridgeStep::AwaitApproval)?;
        let result = self.submit_approval().await;

        let mut state = self.resume(attempt)?;
        state.approving = false;

        match result {
            Ok(tx_hash) => {
                info!(tx_hash = %tx_hash, amount = %self.amount, "Approval included");
                self.advance(&mut state, BridgeStep::AwaitLock);
                Ok(())
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Approval failed");
                let message = format!(
                    "Approval failed. Please check that you have enough gas on {} and try again",
                    self.pair.source.display_name
                );
                self.emit(FlowEvent::Notice(Notice::error(message.clone())));
                Err(FlowError::Submission {
                    action: Action::Approve,
                    message,
                })
            }
        }
    }

    async fn submit_approval(&self) -> EyreResult<TxHash> {
        let source = &self.pair.source;
        let tx_hash = self
            .clients
            .chain
            .approve(source.token_address, source.bridge_address(), self.amount.wei())
            .await
            .wrap_err("Approve submission rejected")?;
        self.clients
            .chain
            .wait_for_inclusion(tx_hash)
            .await
            .wrap_err("Approve not included")?;
        Ok(tx_hash)
    }

    // ========================================================================
    // Lock
    // ========================================================================

    async fn lock(&self) -> Result<(), FlowError> {
        let attempt = self.begin(Action::Lock, BridgeStep::AwaitLock)?;
        let nonce = rand::thread_rng().gen_range(0..NONCE_BOUND);
        let source = &self.pair.source;
        let destination = &self.pair.destination;

        let fee = self
            .clients
            .fees
            .estimate_gas_fee(
                source.axelar_chain,
                destination.axelar_chain,
                source.gas_token,
                self.config.gas_limit,
            )
            .await;

        let fee = match fee {
            Ok(fee) => fee,
            Err(e) => {
                let mut state = self.resume(attempt)?;
                state.locking = false;
                warn!(error = %format!("{:#}", e), "Fee quote failed");
                let message = "Could not get a relay fee quote from Axelar. Please try again";
                self.emit(FlowEvent::Notice(Notice::error(message)));
                return Err(FlowError::Network(message.to_string()));
            }
        };

        debug!(nonce = nonce, fee = %fee, "Relay fee quoted");
        let result = self.submit_lock(fee).await;

        let mut state = self.resume(attempt)?;
        state.locking = false;

        match result {
            Ok(tx_hash) => {
                let transaction = BridgeTransaction {
                    nonce,
                    lock_tx_hash: tx_hash,
                    explorer_url: self.config.explorer_link(tx_hash),
                };
                info!(
                    tx_hash = %tx_hash,
                    nonce = nonce,
                    explorer = %transaction.explorer_url,
                    "Lock included, relaying"
                );
                state.transaction = Some(transaction.clone());
                self.emit(FlowEvent::TransactionRecorded { transaction });
                self.advance(&mut state, BridgeStep::RelaySubmitted);

                let key = PollKey {
                    tx_hash,
                    attempt: state.attempt,
                };
                drop(state);
                self.start_poller(key);
                Ok(())
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Lock failed");
                let message = format!(
                    "Lock failed. Please check that you have enough CHOM and gas on {} and try again",
                    source.display_name
                );
                self.emit(FlowEvent::Notice(Notice::error(message.clone())));
                Err(FlowError::Submission {
                    action: Action::Lock,
                    message,
                })
            }
        }
    }

    async fn submit_lock(&self, fee: U256) -> EyreResult<TxHash> {
        let tx_hash = self
            .clients
            .chain
            .bridge(
                self.pair.source.bridge_address(),
                self.pair.destination.bridge_destination_name,
                self.amount.wei(),
                fee,
            )
            .await
            .wrap_err("Bridge submission rejected")?;
        self.clients
            .chain
            .wait_for_inclusion(tx_hash)
            .await
            .wrap_err("Bridge not included")?;
        Ok(tx_hash)
    }

    // ========================================================================
    // Relayer tracking
    // ========================================================================

    fn start_poller(&self, key: PollKey) {
        let token = self.shutdown.child_token();
        {
            let mut tasks = self.tasks();
            if let Some((_, previous)) = tasks.poller.replace((key, token.clone())) {
                previous.cancel();
            }
        }
        poller::spawn(
            self.weak.clone(),
            key,
            token,
            PollerConfig {
                interval: self.config.poll_interval,
                retry: self.config.retry.clone(),
            },
        );
    }

    fn stop_poller(&self) {
        if let Some((key, token)) = self.tasks().poller.take() {
            debug!(tx_hash = %key.tx_hash, "Stopping status poller");
            token.cancel();
        }
    }

    async fn query(&self, key: PollKey) -> Result<TrackOutcome, FlowError> {
        let response = self
            .clients
            .status
            .query_transaction_status(key.tx_hash)
            .await
            .map_err(|e| FlowError::Network(format!("{:#}", e)))?;
        self.apply_status(key, &response)
    }

    fn apply_status(
        &self,
        key: PollKey,
        response: &GmpStatusResponse,
    ) -> Result<TrackOutcome, FlowError> {
        let mut state = self.state();
        self.ensure_active()?;

        let current = state.transaction.as_ref().map(|tx| tx.lock_tx_hash);
        if state.attempt != key.attempt || current != Some(key.tx_hash) {
            return Ok(TrackOutcome::Stale);
        }
        if !state.step.is_polling() {
            return Ok(TrackOutcome::Unchanged(state.step));
        }

        debug!(
            tx_hash = %key.tx_hash,
            status = %response.status,
            approved = response.approved,
            executed = response.executed,
            "Relayer status"
        );

        if let Some(err) = &response.error {
            error!(tx_hash = %key.tx_hash, error = %err.message, "Relayer reported an error");
            let failure = FlowError::Relayer(err.message.clone());
            self.emit(FlowEvent::Notice(Notice::error(failure.to_string())));
            drop(state);
            self.reset_if(key.attempt, ResetReason::RelayerError);
            return Err(failure);
        }

        let target = if response.executed {
            Some(BridgeStep::DestExecuted)
        } else if response.approved {
            Some(BridgeStep::DestApproved)
        } else if response.is_source_confirmed() {
            Some(BridgeStep::SourceConfirmed)
        } else {
            None
        };

        let before = state.step;
        if let Some(target) = target {
            self.advance(&mut state, target);
        }

        if state.step == before {
            return Ok(TrackOutcome::Unchanged(before));
        }
        if !state.step.is_terminal() {
            return Ok(TrackOutcome::Advanced(state.step));
        }

        info!(tx_hash = %key.tx_hash, "Bridge complete");
        self.emit(FlowEvent::Notice(Notice::success("Bridge success!")));
        let attempt = state.attempt;
        drop(state);

        self.stop_poller();
        self.schedule_reset(attempt);
        Ok(TrackOutcome::Completed)
    }

    fn schedule_reset(&self, attempt: u64) {
        let delay = self.config.reset_delay;
        let token = self.shutdown.child_token();
        if let Some(previous) = self.tasks().reset_timer.replace(token.clone()) {
            previous.cancel();
        }
        self.emit(FlowEvent::ResetScheduled {
            after_ms: delay.as_millis() as u64,
        });

        let weak = self.weak.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.reset_if(attempt, ResetReason::Completed);
                    }
                }
            }
        });
    }

    // ========================================================================
    // Reset
    // ========================================================================

    fn reset(&self, reason: ResetReason) {
        let attempt = self.state().attempt;
        self.reset_if(attempt, reason);
    }

    /// Reset only if `attempt` is still current
    fn reset_if(&self, attempt: u64, reason: ResetReason) {
        {
            let mut state = self.state();
            if self.shutdown.is_cancelled() || state.attempt != attempt {
                return;
            }
            *state = state.next_attempt();
            info!(reason = ?reason, attempt = state.attempt, "Bridge flow reset");
        }
        self.tasks().cancel_all();
        self.emit(FlowEvent::Reset { reason });
        self.emit(FlowEvent::StepChanged {
            step: BridgeStep::AwaitApproval,
        });
    }
}

#[async_trait]
impl StatusTracker for FlowInner {
    async fn track(&self, key: PollKey) -> Result<TrackOutcome, FlowError> {
        self.ensure_active()?;
        self.query(key).await
    }
}
