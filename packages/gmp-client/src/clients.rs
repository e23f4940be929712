//! Client seams used by the bridge flow
//!
//! Each external surface the bridge talks to is an object-safe async trait so
//! the flow can be built against real chain/relayer clients or scripted fakes.
//!
//! | Trait | Backed by |
//! |-------|-----------|
//! | [`ChainWriter`] | Wallet provider on the source chain |
//! | [`BalanceReader`] | Read-only RPC on every registered chain |
//! | [`FeeEstimator`] | Axelar gas-fee estimation API |
//! | [`GmpStatusSource`] | Axelar GMP status (recovery) API |

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use eyre::Result;

use crate::types::{EvmChain, GasToken, GmpStatusResponse};

/// Submits the two user transactions of a bridge attempt and waits for them.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Submit an ERC20 `approve(spender, amount)` on `token`.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash>;

    /// Submit `bridge(destination_chain, amount)` on the bridge contract,
    /// paying `fee` as transaction value.
    async fn bridge(
        &self,
        contract: Address,
        destination_chain: &str,
        amount: U256,
        fee: U256,
    ) -> Result<TxHash>;

    /// Resolve once the transaction is included with a success status.
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<()>;
}

/// Reads ERC20 balances on any registered chain.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn balance_of(&self, chain_id: u64, token: Address, account: Address) -> Result<U256>;
}

/// Quotes the cross-chain gas fee paid alongside the bridge transaction.
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    /// Fee in the source chain's smallest native unit.
    async fn estimate_gas_fee(
        &self,
        source: EvmChain,
        destination: EvmChain,
        gas_token: GasToken,
        gas_limit: u64,
    ) -> Result<U256>;
}

/// Reports relayer progress for a source-chain transaction.
#[async_trait]
pub trait GmpStatusSource: Send + Sync {
    async fn query_transaction_status(&self, tx_hash: TxHash) -> Result<GmpStatusResponse>;
}
