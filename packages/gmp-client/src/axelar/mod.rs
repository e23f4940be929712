//! Axelar API Module
//!
//! HTTP clients for the two relayer-side APIs the bridge consumes:
//!
//! - `environment` - Testnet/mainnet endpoint selection
//! - `query` - Cross-chain gas fee estimation
//! - `recovery` - GMP transaction status lookup

pub mod environment;
pub mod query;
pub mod recovery;

pub use environment::{AxelarEnvironment, UnknownEnvironment};
pub use query::AxelarQueryClient;
pub use recovery::AxelarRecoveryClient;

use std::time::Duration;

/// Request timeout applied to every Axelar API call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared reqwest client with the default request timeout
pub(crate) fn http_client() -> eyre::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))
}
