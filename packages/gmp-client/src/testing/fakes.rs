//! Scripted Client Fakes
//!
//! Each fake pops scripted outcomes from a queue and records what it was asked
//! to do. Unscripted calls succeed with a deterministic default.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};

use crate::clients::{BalanceReader, ChainWriter, FeeEstimator, GmpStatusSource};
use crate::types::{EvmChain, GasToken, GmpError, GmpStatus, GmpStatusResponse};

/// Deterministic transaction hash for the n-th submitted transaction
pub fn fake_tx_hash(n: u8) -> TxHash {
    TxHash::repeat_byte(n)
}

// ============================================================================
// Chain Writer
// ============================================================================

/// A recorded `approve` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveCall {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// A recorded `bridge` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCall {
    pub contract: Address,
    pub destination_chain: String,
    pub amount: U256,
    pub fee: U256,
}

#[derive(Default)]
struct ChainScript {
    approve: VecDeque<Result<TxHash, String>>,
    bridge: VecDeque<Result<TxHash, String>>,
    inclusion: VecDeque<Result<(), String>>,
    approve_calls: Vec<ApproveCall>,
    bridge_calls: Vec<BridgeCall>,
    waited: Vec<TxHash>,
    submitted: u8,
}

/// Wallet provider fake
#[derive(Default)]
pub struct FakeChainWriter {
    script: Mutex<ChainScript>,
}

impl FakeChainWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `approve` submission fail with `message`
    pub fn fail_next_approve(&self, message: &str) {
        self.lock().approve.push_back(Err(message.to_string()));
    }

    /// Make the next `bridge` submission fail with `message`
    pub fn fail_next_bridge(&self, message: &str) {
        self.lock().bridge.push_back(Err(message.to_string()));
    }

    /// Make the next `wait_for_inclusion` fail with `message`
    pub fn fail_next_inclusion(&self, message: &str) {
        self.lock().inclusion.push_back(Err(message.to_string()));
    }

    /// Return `hash` from the next `bridge` submission
    pub fn next_bridge_hash(&self, hash: TxHash) {
        self.lock().bridge.push_back(Ok(hash));
    }

    pub fn approve_calls(&self) -> Vec<ApproveCall> {
        self.lock().approve_calls.clone()
    }

    pub fn bridge_calls(&self) -> Vec<BridgeCall> {
        self.lock().bridge_calls.clone()
    }

    /// Hashes passed to `wait_for_inclusion`, in order
    pub fn waited(&self) -> Vec<TxHash> {
        self.lock().waited.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainScript> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChainWriter for FakeChainWriter {
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash> {
        let mut script = self.lock();
        script.approve_calls.push(ApproveCall {
            token,
            spender,
            amount,
        });
        match script.approve.pop_front() {
            Some(outcome) => outcome.map_err(|e| eyre!(e)),
            None => {
                script.submitted = script.submitted.wrapping_add(1);
                Ok(fake_tx_hash(script.submitted))
            }
        }
    }

    async fn bridge(
        &self,
        contract: Address,
        destination_chain: &str,
        amount: U256,
        fee: U256,
    ) -> Result<TxHash> {
        let mut script = self.lock();
        script.bridge_calls.push(BridgeCall {
            contract,
            destination_chain: destination_chain.to_string(),
            amount,
            fee,
        });
        match script.bridge.pop_front() {
            Some(outcome) => outcome.map_err(|e| eyre!(e)),
            None => {
                script.submitted = script.submitted.wrapping_add(1);
                Ok(fake_tx_hash(script.submitted))
            }
        }
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<()> {
        let mut script = self.lock();
        script.waited.push(tx_hash);
        match script.inclusion.pop_front() {
            Some(outcome) => outcome.map_err(|e| eyre!(e)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Fee Estimator
// ============================================================================

/// A recorded fee quote request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRequest {
    pub source: EvmChain,
    pub destination: EvmChain,
    pub gas_token: GasToken,
    pub gas_limit: u64,
}

/// Fee estimator fake returning a fixed fee unless told to fail
pub struct FakeFeeEstimator {
    fee: U256,
    failures: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<FeeRequest>>,
}

impl FakeFeeEstimator {
    pub fn new(fee: U256) -> Self {
        Self {
            fee,
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(&self, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(message.to_string());
    }

    pub fn requests(&self) -> Vec<FeeRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl FeeEstimator for FakeFeeEstimator {
    async fn estimate_gas_fee(
        &self,
        source: EvmChain,
        destination: EvmChain,
        gas_token: GasToken,
        gas_limit: u64,
    ) -> Result<U256> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FeeRequest {
                source,
                destination,
                gas_token,
                gas_limit,
            });
        if let Some(message) = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return Err(eyre!(message));
        }
        Ok(self.fee)
    }
}

// ============================================================================
// GMP Status Source
// ============================================================================

/// One scripted relayer answer
#[derive(Debug, Clone)]
pub enum StatusStep {
    /// Relayer answers with these flags
    Report {
        status: GmpStatus,
        approved: bool,
        executed: bool,
    },
    /// Relayer reports a failure for the message
    RelayerError(String),
    /// Request fails at the transport level
    TransportError(String),
}

impl StatusStep {
    pub fn pending() -> Self {
        StatusStep::Report {
            status: GmpStatus::SourceGatewayCalled,
            approved: false,
            executed: false,
        }
    }

    pub fn confirmed() -> Self {
        StatusStep::Report {
            status: GmpStatus::SourceGatewayConfirmed,
            approved: false,
            executed: false,
        }
    }

    pub fn approved() -> Self {
        StatusStep::Report {
            status: GmpStatus::DestinationGatewayApproved,
            approved: true,
            executed: false,
        }
    }

    pub fn executed() -> Self {
        StatusStep::Report {
            status: GmpStatus::DestinationExecuted,
            approved: true,
            executed: true,
        }
    }
}

/// Relayer status fake answering from a script.
///
/// When the script runs out the last answer is repeated; an empty script
/// answers `cannot_fetch_status`.
pub struct ScriptedStatusSource {
    script: Mutex<VecDeque<StatusStep>>,
    last: Mutex<Option<StatusStep>>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedStatusSource {
    pub fn new(steps: impl IntoIterator<Item = StatusStep>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Delay every answer by `latency` (tokio time)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Append answers to the script
    pub fn push(&self, step: StatusStep) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
    }

    /// Number of status queries received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of queries that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<StatusStep> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match next {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl GmpStatusSource for ScriptedStatusSource {
    async fn query_transaction_status(&self, tx_hash: TxHash) -> Result<GmpStatusResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self.next_step();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match step {
            None => Ok(GmpStatusResponse::not_found(tx_hash)),
            Some(StatusStep::Report {
                status,
                approved,
                executed,
            }) => Ok(GmpStatusResponse {
                tx_hash,
                status,
                approved,
                executed,
                error: None,
            }),
            Some(StatusStep::RelayerError(message)) => Ok(GmpStatusResponse {
                tx_hash,
                status: GmpStatus::DestinationExecuteError,
                approved: false,
                executed: false,
                error: Some(GmpError { message }),
            }),
            Some(StatusStep::TransportError(message)) => Err(eyre!(message)),
        }
    }
}

// ============================================================================
// Balance Reader
// ============================================================================

/// Balance reader fake keyed by (chain, account)
#[derive(Default)]
pub struct FakeBalanceReader {
    balances: Mutex<HashMap<(u64, Address), Result<U256, String>>>,
}

impl FakeBalanceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, chain_id: u64, account: Address, balance: U256) {
        self.balances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((chain_id, account), Ok(balance));
    }

    pub fn set_error(&self, chain_id: u64, account: Address, message: &str) {
        self.balances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((chain_id, account), Err(message.to_string()));
    }
}

#[async_trait]
impl BalanceReader for FakeBalanceReader {
    async fn balance_of(&self, chain_id: u64, _token: Address, account: Address) -> Result<U256> {
        match self
            .balances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(chain_id, account))
        {
            Some(Ok(balance)) => Ok(*balance),
            Some(Err(message)) => Err(eyre!(message.clone())),
            None => Ok(U256::ZERO),
        }
    }
}
