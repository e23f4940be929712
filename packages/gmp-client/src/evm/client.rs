//! EVM wallet client for bridge transactions
//!
//! Signs and submits the `approve` and `bridge` transactions of a bridge
//! attempt and waits for their receipts.
//!
//! # Transaction Building
//!
//! Uses Alloy's `ProviderBuilder::with_recommended_fillers()` to populate
//! nonce, gas limit and EIP-1559 fee fields before signing.
//!
//! # Usage
//!
//! ```ignore
//! let client = EvmWalletClient::new(rpc_url, 4002, private_key)?;
//! let hash = client.approve(token, bridge, amount).await?;
//! client.wait_for_inclusion(hash).await?;
//! ```

use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::{debug, info};

use crate::clients::ChainWriter;
use crate::evm::contracts::{ChomToken, ERC20};

/// How receipts are awaited after submission
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolling {
    /// Delay between `eth_getTransactionReceipt` calls
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Signing client for one EVM chain
pub struct EvmWalletClient {
    rpc_url: String,
    chain_id: u64,
    signer: PrivateKeySigner,
    receipts: ReceiptPolling,
}

impl EvmWalletClient {
    /// Create a new wallet client
    pub fn new(rpc_url: &str, chain_id: u64, private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key.parse().wrap_err("Invalid private key")?;
        // Fail early on a malformed URL rather than at the first transaction
        let _: url::Url = rpc_url.parse().wrap_err("Invalid RPC URL")?;

        info!(
            chain_id = chain_id,
            address = %signer.address(),
            "EVM wallet client initialized"
        );

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            chain_id,
            signer,
            receipts: ReceiptPolling::default(),
        })
    }

    /// Override receipt polling interval/timeout
    pub fn with_receipt_polling(mut self, receipts: ReceiptPolling) -> Self {
        self.receipts = receipts;
        self
    }

    /// Address that signs bridge transactions
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ChainWriter for EvmWalletClient {
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);

        let contract = ERC20::new(token, &provider);

        debug!(token = %token, spender = %spender, amount = %amount, "Submitting approve");

        let pending_tx = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send approve tx: {}", e))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, chain_id = self.chain_id, "Approve transaction sent");
        Ok(tx_hash)
    }

    async fn bridge(
        &self,
        contract: Address,
        destination_chain: &str,
        amount: U256,
        fee: U256,
    ) -> Result<TxHash> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);

        let token = ChomToken::new(contract, &provider);

        debug!(
            contract = %contract,
            destination = destination_chain,
            amount = %amount,
            fee = %fee,
            "Submitting bridge"
        );

        let pending_tx = token
            .bridge(destination_chain.to_string(), amount)
            .value(fee)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send bridge tx: {}", e))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, chain_id = self.chain_id, "Bridge transaction sent");
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<()> {
        let provider =
            ProviderBuilder::new().on_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);
        let interval = self.receipts.interval;

        let receipt = tokio::time::timeout(self.receipts.timeout, async {
            loop {
                match provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => debug!(tx_hash = %tx_hash, "Receipt not available yet"),
                    Err(e) => return Err(eyre!("Failed to get receipt: {}", e)),
                }
                tokio::time::sleep(interval).await;
            }
        })
        .await
        .map_err(|_| {
            eyre!(
                "Timed out after {:?} waiting for {}",
                self.receipts.timeout,
                tx_hash
            )
        })??;

        if !receipt.status() {
            return Err(eyre!("Transaction {} reverted", tx_hash));
        }

        info!(
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            "Transaction included"
        );
        Ok(())
    }
}
