//! Multi-chain ERC20 balance reads
//!
//! Holds one read-only provider per configured chain so balances on both the
//! source and destination chain can be read without a signer.

use std::collections::HashMap;

use alloy::{
    primitives::{Address, U256},
    providers::{ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::{debug, info};

use crate::clients::BalanceReader;
use crate::evm::contracts::ERC20;

/// Read-only balance reader keyed by native chain ID
#[derive(Default)]
pub struct EvmBalanceReader {
    providers: HashMap<u64, RootProvider<Http<Client>>>,
}

impl EvmBalanceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an RPC endpoint for `chain_id`, replacing any previous one.
    pub fn add_chain(&mut self, chain_id: u64, rpc_url: &str) -> Result<()> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        info!(rpc_url = %rpc_url, chain_id = chain_id, "Registered balance RPC");
        self.providers.insert(chain_id, provider);
        Ok(())
    }

    /// Builder-style [`add_chain`](Self::add_chain)
    pub fn with_chain(mut self, chain_id: u64, rpc_url: &str) -> Result<Self> {
        self.add_chain(chain_id, rpc_url)?;
        Ok(self)
    }

    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.providers.contains_key(&chain_id)
    }
}

#[async_trait]
impl BalanceReader for EvmBalanceReader {
    async fn balance_of(&self, chain_id: u64, token: Address, account: Address) -> Result<U256> {
        let provider = self
            .providers
            .get(&chain_id)
            .ok_or_else(|| eyre!("No RPC configured for chain {}", chain_id))?;

        let contract = ERC20::new(token, provider);
        let balance = contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get balance: {}", e))?;

        debug!(chain_id = chain_id, account = %account, balance = %balance._0, "Read token balance");
        Ok(balance._0)
    }
}
