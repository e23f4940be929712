//! Bridge flow integration tests
//!
//! Every external client is a scripted fake from `gmp_client::testing`, and
//! tokio time is paused so polling and reset delays run instantly.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chom_bridge::chains::FANTOM_TESTNET_CHAIN_ID;
use chom_bridge::flow::NONCE_BOUND;
use chom_bridge::poller::TrackOutcome;
use chom_bridge::{
    Action, BridgeAmount, BridgeClients, BridgeFlow, BridgeStep, ChainRegistry, FlowConfig,
    FlowError, FlowEvent, ResetReason,
};
use gmp_client::clients::ChainWriter;
use gmp_client::testing::{
    fake_tx_hash, FakeChainWriter, FakeFeeEstimator, ScriptedStatusSource, StatusStep,
};
use tokio::sync::mpsc::UnboundedReceiver;

const FEE_WEI: u64 = 250_000_000_000_000_000;

struct Harness {
    flow: BridgeFlow,
    events: UnboundedReceiver<FlowEvent>,
    chain: Arc<FakeChainWriter>,
    fees: Arc<FakeFeeEstimator>,
    status: Arc<ScriptedStatusSource>,
}

fn harness(status: ScriptedStatusSource) -> Harness {
    harness_with_chain(status, Arc::new(FakeChainWriter::new()), None)
}

fn harness_with_chain(
    status: ScriptedStatusSource,
    chain: Arc<FakeChainWriter>,
    writer: Option<Arc<dyn ChainWriter>>,
) -> Harness {
    let fees = Arc::new(FakeFeeEstimator::new(U256::from(FEE_WEI)));
    let status = Arc::new(status);
    let clients = BridgeClients {
        chain: writer.unwrap_or_else(|| chain.clone() as Arc<dyn ChainWriter>),
        fees: fees.clone(),
        status: status.clone(),
    };
    let pair = ChainRegistry::testnet()
        .pair(FANTOM_TESTNET_CHAIN_ID)
        .unwrap();
    let amount = BridgeAmount::parse("10").unwrap();
    let (flow, events) = BridgeFlow::new(clients, FlowConfig::default(), pair, amount);

    Harness {
        flow,
        events,
        chain,
        fees,
        status,
    }
}

fn drain(events: &mut UnboundedReceiver<FlowEvent>) -> Vec<FlowEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn step_indices(events: &[FlowEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| e.step())
        .map(|s| s.index())
        .collect()
}

fn error_notices(events: &[FlowEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.notice())
        .filter(|n| n.is_error())
        .map(|n| n.message.clone())
        .collect()
}

fn success_notices(events: &[FlowEvent]) -> usize {
    events
        .iter()
        .filter_map(|e| e.notice())
        .filter(|n| !n.is_error())
        .count()
}

fn resets(events: &[FlowEvent]) -> Vec<ResetReason> {
    events
        .iter()
        .filter_map(|e| match e {
            FlowEvent::Reset { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Chain writer whose approve takes `delay` to be acknowledged
struct SlowApproveChain {
    inner: Arc<FakeChainWriter>,
    delay: Duration,
}

#[async_trait]
impl ChainWriter for SlowApproveChain {
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> eyre::Result<TxHash> {
        tokio::time::sleep(self.delay).await;
        self.inner.approve(token, spender, amount).await
    }

    async fn bridge(
        &self,
        contract: Address,
        destination_chain: &str,
        amount: U256,
        fee: U256,
    ) -> eyre::Result<TxHash> {
        self.inner
            .bridge(contract, destination_chain, amount, fee)
            .await
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> eyre::Result<()> {
        self.inner.wait_for_inclusion(tx_hash).await
    }
}

async fn wait_until_approving(flow: &BridgeFlow) {
    while !flow.snapshot().approving {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_happy_path_walks_every_step() {
    let mut h = harness(ScriptedStatusSource::new([
        StatusStep::pending(),
        StatusStep::confirmed(),
        StatusStep::approved(),
        StatusStep::executed(),
    ]));

    tokio_test::assert_ok!(h.flow.approve().await);
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);

    // Polls at 3s, 6s, 9s and 12s
    tokio::time::sleep(Duration::from_secs(13)).await;

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(success_notices(&events), 1);
    assert!(error_notices(&events).is_empty());
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, FlowEvent::ResetScheduled { after_ms: 3000 }))
            .count(),
        1
    );
    assert_eq!(h.status.calls(), 4);

    // The poller is stopped once the destination executed
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.status.calls(), 4);
    assert_eq!(h.flow.snapshot().step, BridgeStep::DestExecuted);

    // Reset after the delay
    tokio::time::sleep(Duration::from_secs(3)).await;
    let events = drain(&mut h.events);
    assert_eq!(resets(&events), vec![ResetReason::Completed]);
    assert_eq!(step_indices(&events), vec![0]);

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitApproval);
    assert_eq!(state.attempt, 1);
    assert!(state.transaction.is_none());
    assert_eq!(h.status.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_transactions_carry_amount_fee_and_destination() {
    let mut h = harness(ScriptedStatusSource::new([]));
    h.flow.approve().await.unwrap();

    let pair = h.flow.pair().clone();
    let approves = h.chain.approve_calls();
    assert_eq!(approves.len(), 1);
    assert_eq!(approves[0].token, pair.source.token_address);
    assert_eq!(approves[0].spender, pair.source.bridge_address());
    assert_eq!(approves[0].amount, ether(10));

    let bridges = h.chain.bridge_calls();
    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].contract, pair.source.token_address);
    assert_eq!(bridges[0].destination_chain, "Avalanche");
    assert_eq!(bridges[0].amount, ether(10));
    assert_eq!(bridges[0].fee, U256::from(FEE_WEI));

    let requests = h.fees.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source, pair.source.axelar_chain);
    assert_eq!(requests[0].destination, pair.destination.axelar_chain);
    assert_eq!(requests[0].gas_token, pair.source.gas_token);
    assert_eq!(requests[0].gas_limit, 150_000);

    // Both transactions were awaited, approval first
    assert_eq!(h.chain.waited(), vec![fake_tx_hash(1), fake_tx_hash(2)]);

    let tx = h.flow.snapshot().transaction.unwrap();
    assert_eq!(tx.lock_tx_hash, fake_tx_hash(2));
    assert!(tx.nonce < NONCE_BOUND);
    assert!(tx
        .explorer_url
        .starts_with("https://testnet.axelarscan.io/gmp/0x"));

    let events = drain(&mut h.events);
    assert!(events.iter().any(
        |e| matches!(e, FlowEvent::TransactionRecorded { transaction } if transaction.lock_tx_hash == fake_tx_hash(2))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_failed_lock_can_be_retried() {
    let mut h = harness(ScriptedStatusSource::new([]));
    h.chain.fail_next_bridge("replacement transaction underpriced");

    let err = h.flow.approve().await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Submission {
            action: Action::Lock,
            ..
        }
    ));

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitLock);
    assert!(!state.locking);
    assert!(state.transaction.is_none());

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![0, 1]);
    assert_eq!(error_notices(&events).len(), 1);
    assert!(error_notices(&events)[0].contains("Fantom"));

    h.flow.lock().await.unwrap();
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);
    assert_eq!(h.chain.bridge_calls().len(), 2);
    assert_eq!(h.chain.approve_calls().len(), 1);

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![2]);
    assert!(error_notices(&events).is_empty());
}

// ============================================================================
// User actions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rejected_approval_stays_at_step_zero() {
    let mut h = harness(ScriptedStatusSource::new([]));
    h.chain.fail_next_approve("user rejected the request");

    let err = h.flow.approve().await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Submission {
            action: Action::Approve,
            ..
        }
    ));

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitApproval);
    assert!(!state.approving);
    assert!(h.chain.bridge_calls().is_empty());
    assert!(h.fees.requests().is_empty());

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![0]);
    assert_eq!(error_notices(&events).len(), 1);

    // Retry goes through
    h.flow.approve().await.unwrap();
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);
}

#[tokio::test(start_paused = true)]
async fn test_reverted_approval_does_not_advance() {
    let mut h = harness(ScriptedStatusSource::new([]));
    h.chain.fail_next_inclusion("transaction reverted");

    assert!(h.flow.approve().await.is_err());
    assert_eq!(h.flow.snapshot().step, BridgeStep::AwaitApproval);
    assert_eq!(h.chain.waited(), vec![fake_tx_hash(1)]);
    assert_eq!(error_notices(&drain(&mut h.events)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fee_quote_failure_keeps_step_one() {
    let mut h = harness(ScriptedStatusSource::new([]));
    h.fees.fail_next("503 Service Unavailable");

    let err = tokio_test::assert_err!(h.flow.approve().await);
    assert!(matches!(err, FlowError::Network(_)));

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitLock);
    assert!(!state.locking);
    assert!(h.chain.bridge_calls().is_empty());
    assert_eq!(error_notices(&drain(&mut h.events)).len(), 1);

    h.flow.lock().await.unwrap();
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);
}

#[tokio::test(start_paused = true)]
async fn test_actions_at_wrong_step_are_rejected() {
    let mut h = harness(ScriptedStatusSource::new([]));

    assert_eq!(
        h.flow.lock().await.unwrap_err(),
        FlowError::WrongStep {
            action: Action::Lock,
            step: 0
        }
    );
    assert_eq!(
        h.flow.track_status().await.unwrap_err(),
        FlowError::WrongStep {
            action: Action::Track,
            step: 0
        }
    );

    h.flow.approve().await.unwrap();
    assert_eq!(
        h.flow.approve().await.unwrap_err(),
        FlowError::WrongStep {
            action: Action::Approve,
            step: 2
        }
    );

    // Precondition failures are not user notices
    assert!(error_notices(&drain(&mut h.events)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_approve_is_busy() {
    let chain = Arc::new(FakeChainWriter::new());
    let slow: Arc<dyn ChainWriter> = Arc::new(SlowApproveChain {
        inner: chain.clone(),
        delay: Duration::from_secs(5),
    });
    let h = harness_with_chain(ScriptedStatusSource::new([]), chain, Some(slow));

    let flow = h.flow.clone();
    let first = tokio::spawn(async move { flow.approve().await });
    wait_until_approving(&h.flow).await;

    assert_eq!(
        h.flow.approve().await.unwrap_err(),
        FlowError::Busy(Action::Approve)
    );

    first.await.unwrap().unwrap();
    assert_eq!(h.chain.approve_calls().len(), 1);
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);
}

#[tokio::test(start_paused = true)]
async fn test_result_after_reset_is_discarded() {
    let chain = Arc::new(FakeChainWriter::new());
    let slow: Arc<dyn ChainWriter> = Arc::new(SlowApproveChain {
        inner: chain.clone(),
        delay: Duration::from_secs(5),
    });
    let mut h = harness_with_chain(ScriptedStatusSource::new([]), chain, Some(slow));

    let flow = h.flow.clone();
    let pending = tokio::spawn(async move { flow.approve().await });
    wait_until_approving(&h.flow).await;

    h.flow.reset().unwrap();
    assert_eq!(pending.await.unwrap().unwrap_err(), FlowError::Superseded);

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitApproval);
    assert_eq!(state.attempt, 1);
    assert!(!state.approving);
    assert!(h.chain.bridge_calls().is_empty());

    let events = drain(&mut h.events);
    assert_eq!(resets(&events), vec![ResetReason::Requested]);
    assert!(error_notices(&events).is_empty());
}

// ============================================================================
// Relayer tracking
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_track_status_is_monotonic_and_idempotent() {
    let mut h = harness(ScriptedStatusSource::new([StatusStep::confirmed()]));
    h.flow.approve().await.unwrap();

    assert_eq!(
        h.flow.track_status().await.unwrap(),
        TrackOutcome::Advanced(BridgeStep::SourceConfirmed)
    );

    // A lagging answer is a no-op
    h.status.push(StatusStep::pending());
    assert_eq!(
        h.flow.track_status().await.unwrap(),
        TrackOutcome::Unchanged(BridgeStep::SourceConfirmed)
    );

    h.status.push(StatusStep::executed());
    assert_eq!(h.flow.track_status().await.unwrap(), TrackOutcome::Completed);

    let calls = h.status.calls();
    for _ in 0..3 {
        assert_eq!(
            h.flow.track_status().await.unwrap(),
            TrackOutcome::Unchanged(BridgeStep::DestExecuted)
        );
    }
    assert_eq!(h.status.calls(), calls);

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(success_notices(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_executed_jump_enters_every_step() {
    let mut h = harness(ScriptedStatusSource::new([StatusStep::executed()]));
    h.flow.approve().await.unwrap();
    drain(&mut h.events);

    assert_eq!(h.flow.track_status().await.unwrap(), TrackOutcome::Completed);
    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_relayer_error_resets_exactly_once() {
    let mut h = harness(ScriptedStatusSource::new([
        StatusStep::confirmed(),
        StatusStep::RelayerError("execution reverted".to_string()),
    ]));
    h.flow.approve().await.unwrap();

    // Polls at 3s (confirmed) and 6s (error)
    tokio::time::sleep(Duration::from_secs(7)).await;

    let events = drain(&mut h.events);
    assert_eq!(step_indices(&events), vec![0, 1, 2, 3, 0]);
    assert_eq!(
        error_notices(&events),
        vec!["Axelar Error: execution reverted".to_string()]
    );
    assert_eq!(resets(&events), vec![ResetReason::RelayerError]);

    let state = h.flow.snapshot();
    assert_eq!(state.step, BridgeStep::AwaitApproval);
    assert_eq!(state.attempt, 1);
    assert!(state.transaction.is_none());

    // Polling stopped with the reset
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.status.calls(), 2);
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_relayer_errors_reset_once() {
    let mut h = harness(
        ScriptedStatusSource::new([StatusStep::RelayerError("insufficient fee".to_string())])
            .with_latency(Duration::from_secs(1)),
    );
    h.flow.approve().await.unwrap();

    let (first, second) = tokio::join!(h.flow.track_status(), h.flow.track_status());
    let outcomes = [first, second];
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(FlowError::Relayer(_))))
            .count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Ok(TrackOutcome::Stale)))
            .count(),
        1
    );

    let events = drain(&mut h.events);
    assert_eq!(resets(&events).len(), 1);
    assert_eq!(error_notices(&events).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_back_off_without_notices() {
    let mut h = harness(ScriptedStatusSource::new([
        StatusStep::TransportError("connection reset".to_string()),
        StatusStep::TransportError("connection reset".to_string()),
        StatusStep::executed(),
    ]));
    h.flow.approve().await.unwrap();

    // Polls at 3s and 6s fail; the next one waits 6s
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(h.status.calls(), 2);
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.status.calls(), 3);
    assert_eq!(h.flow.snapshot().step, BridgeStep::DestExecuted);

    let events = drain(&mut h.events);
    assert!(error_notices(&events).is_empty());
    assert_eq!(success_notices(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_relayer_never_overlaps_polls() {
    let h = harness(
        ScriptedStatusSource::new([StatusStep::pending()]).with_latency(Duration::from_secs(10)),
    );
    h.flow.approve().await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(h.status.calls() >= 4);
    assert_eq!(h.status.max_in_flight(), 1);
}

// ============================================================================
// Reset and disposal
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_polling() {
    let mut h = harness(ScriptedStatusSource::new([StatusStep::confirmed()]));
    h.flow.approve().await.unwrap();
    drain(&mut h.events);

    h.flow.reset().unwrap();
    let events = drain(&mut h.events);
    assert_eq!(resets(&events), vec![ResetReason::Requested]);
    assert_eq!(step_indices(&events), vec![0]);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.status.calls(), 0);
    assert_eq!(h.flow.snapshot().step, BridgeStep::AwaitApproval);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_stops_everything() {
    let h = harness(ScriptedStatusSource::new([StatusStep::confirmed()]));
    h.flow.approve().await.unwrap();

    h.flow.dispose();
    assert!(h.flow.is_disposed());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.status.calls(), 0);
    assert_eq!(h.flow.snapshot().step, BridgeStep::RelaySubmitted);

    assert_eq!(h.flow.track_status().await.unwrap_err(), FlowError::Disposed);
    assert_eq!(h.flow.lock().await.unwrap_err(), FlowError::Disposed);
    assert_eq!(h.flow.reset().unwrap_err(), FlowError::Disposed);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_pending_reset() {
    let mut h = harness(ScriptedStatusSource::new([StatusStep::executed()]));
    h.flow.approve().await.unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(h.flow.snapshot().step, BridgeStep::DestExecuted);

    h.flow.dispose();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let events = drain(&mut h.events);
    assert!(resets(&events).is_empty());
    assert_eq!(h.flow.snapshot().step, BridgeStep::DestExecuted);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_flow_stops_poller() {
    let Harness {
        flow,
        mut events,
        status,
        ..
    } = harness(ScriptedStatusSource::new([StatusStep::confirmed()]));
    flow.approve().await.unwrap();
    drop(flow);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(status.calls(), 0);

    drain(&mut events);
    assert!(events.recv().await.is_none());
}
