//! Token balance display
//!
//! Read-only: one `balanceOf` per chain, no retries or caching of its own.
//! A failed read is rendered as `unavailable` rather than left looking like a
//! pending one.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use gmp_client::clients::BalanceReader;
use tracing::{debug, warn};

use crate::amount::format_token_amount;
use crate::chains::{ChainInfo, ChainPair};

/// What to show for one balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceDisplay {
    Loading,
    Ready(U256),
    Unavailable(String),
}

impl BalanceDisplay {
    pub fn render(&self) -> String {
        match self {
            BalanceDisplay::Loading => "...".to_string(),
            BalanceDisplay::Ready(balance) => format_token_amount(*balance),
            BalanceDisplay::Unavailable(_) => "unavailable".to_string(),
        }
    }

    pub fn balance(&self) -> Option<U256> {
        match self {
            BalanceDisplay::Ready(balance) => Some(*balance),
            _ => None,
        }
    }
}

impl fmt::Display for BalanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Balances of both sides of a bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairBalances {
    pub source: BalanceDisplay,
    pub destination: BalanceDisplay,
}

#[derive(Clone)]
pub struct BalanceView {
    reader: Arc<dyn BalanceReader>,
}

impl BalanceView {
    pub fn new(reader: Arc<dyn BalanceReader>) -> Self {
        Self { reader }
    }

    /// Read the CHOM balance of `account` on `chain`.
    pub async fn load(&self, account: Address, chain: &ChainInfo) -> BalanceDisplay {
        match self
            .reader
            .balance_of(chain.chain_id, chain.token_address, account)
            .await
        {
            Ok(balance) => {
                debug!(
                    chain_id = chain.chain_id,
                    account = %account,
                    balance = %balance,
                    "Balance loaded"
                );
                BalanceDisplay::Ready(balance)
            }
            Err(e) => {
                warn!(
                    chain_id = chain.chain_id,
                    account = %account,
                    error = %format!("{:#}", e),
                    "Balance read failed"
                );
                BalanceDisplay::Unavailable(format!("{:#}", e))
            }
        }
    }

    /// Read both chains of `pair` concurrently.
    pub async fn load_pair(&self, account: Address, pair: &ChainPair) -> PairBalances {
        let (source, destination) = tokio::join!(
            self.load(account, &pair.source),
            self.load(account, &pair.destination)
        );
        PairBalances {
            source,
            destination,
        }
    }
}
