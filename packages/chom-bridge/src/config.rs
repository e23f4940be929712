//! CLI configuration

use std::env;
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use gmp_client::{AxelarEnvironment, Redacted};
use url::Url;

use crate::chains::{AVALANCHE_FUJI_CHAIN_ID, FANTOM_TESTNET_CHAIN_ID};
use crate::flow::{FlowConfig, DEFAULT_GAS_LIMIT};
use crate::retry::RetryConfig;

/// Bridge CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub axelar_environment: AxelarEnvironment,
    /// Axelarscan API base; defaults per environment
    pub axelar_api_url: Url,
    /// Axelarscan explorer base for transaction links
    pub explorer_url: Url,

    pub fantom_rpc_url: String,
    pub avalanche_rpc_url: String,

    /// Chain the wallet bridges from
    pub source_chain_id: u64,
    /// Signing key; only needed for `bridge`
    pub wallet_private_key: Option<Redacted<String>>,

    pub poll_interval_ms: u64,
    pub reset_delay_ms: u64,
    pub gas_limit: u64,
    pub receipt_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_env()
    }

    /// Read configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        let axelar_environment: AxelarEnvironment = match env::var("AXELAR_ENVIRONMENT") {
            Ok(v) => v.parse()?,
            Err(_) => AxelarEnvironment::default(),
        };

        let axelar_api_url = match env::var("AXELAR_API_URL") {
            Ok(v) => Url::parse(&v).wrap_err("Invalid AXELAR_API_URL")?,
            Err(_) => axelar_environment.api_url(),
        };
        let explorer_url = match env::var("AXELARSCAN_URL") {
            Ok(v) => Url::parse(&v).wrap_err("Invalid AXELARSCAN_URL")?,
            Err(_) => axelar_environment.explorer_url(),
        };

        let source_chain_id = match env::var("SOURCE_CHAIN_ID") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| eyre!("Invalid SOURCE_CHAIN_ID"))?,
            Err(_) => FANTOM_TESTNET_CHAIN_ID,
        };
        if source_chain_id != FANTOM_TESTNET_CHAIN_ID && source_chain_id != AVALANCHE_FUJI_CHAIN_ID {
            return Err(eyre!(
                "SOURCE_CHAIN_ID must be {} or {}, got {}",
                FANTOM_TESTNET_CHAIN_ID,
                AVALANCHE_FUJI_CHAIN_ID,
                source_chain_id
            ));
        }

        Ok(Self {
            axelar_environment,
            axelar_api_url,
            explorer_url,

            fantom_rpc_url: env::var("FANTOM_RPC_URL")
                .map_err(|_| eyre!("FANTOM_RPC_URL required"))?,
            avalanche_rpc_url: env::var("AVALANCHE_RPC_URL")
                .map_err(|_| eyre!("AVALANCHE_RPC_URL required"))?,

            source_chain_id,
            wallet_private_key: env::var("WALLET_PRIVATE_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(Redacted),

            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            reset_delay_ms: env::var("RESET_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            gas_limit: env::var("GAS_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GAS_LIMIT),
            receipt_timeout_ms: env::var("RECEIPT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120_000),
        })
    }

    /// RPC endpoint for a registry chain
    pub fn rpc_url(&self, chain_id: u64) -> Result<&str> {
        match chain_id {
            FANTOM_TESTNET_CHAIN_ID => Ok(&self.fantom_rpc_url),
            AVALANCHE_FUJI_CHAIN_ID => Ok(&self.avalanche_rpc_url),
            other => Err(eyre!("No RPC configured for chain {}", other)),
        }
    }

    /// Private key, failing with a hint when unset
    pub fn require_private_key(&self) -> Result<&str> {
        self.wallet_private_key
            .as_ref()
            .map(|k| k.expose().as_str())
            .ok_or_else(|| eyre!("WALLET_PRIVATE_KEY required for bridging"))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }

    pub fn flow_config(&self) -> FlowConfig {
        let poll_interval = Duration::from_millis(self.poll_interval_ms);
        FlowConfig {
            gas_limit: self.gas_limit,
            poll_interval,
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            retry: RetryConfig::for_poll_interval(poll_interval),
            explorer_url: self.explorer_url.clone(),
        }
    }
}
