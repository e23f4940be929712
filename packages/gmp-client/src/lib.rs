//! GMP-Client: Shared Cross-Chain Library for the CHOM Bridge
//!
//! This crate provides the external-facing half of the bridge application:
//!
//! - **Clients** - Async seams for the wallet provider, balance reads, fee quotes
//!   and relayer status, injected into the bridge flow as `Arc<dyn _>`
//! - **Types** - Axelar chain identifiers, gas tokens and GMP status responses
//! - **EVM Module** - alloy-backed wallet and balance clients, contract bindings
//! - **Axelar Module** - HTTP clients for the fee-estimation and GMP status APIs
//! - **Testing Module** - Scripted fakes for every client seam
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! gmp-client = { path = "../gmp-client" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Enable the alloy-backed EVM clients (default)
//! - `testing` - Enable scripted fakes for tests
//! - `full` - Enable all features

// Core modules (always available)
pub mod axelar;
pub mod clients;
pub mod redact;
pub mod types;

// Chain-specific modules (feature-gated)
#[cfg(feature = "evm")]
pub mod evm;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used items at the crate root
pub use alloy::primitives::{Address, TxHash, U256};
pub use axelar::{AxelarEnvironment, AxelarQueryClient, AxelarRecoveryClient};
pub use clients::{BalanceReader, ChainWriter, FeeEstimator, GmpStatusSource};
pub use redact::Redacted;
pub use types::{EvmChain, GasToken, GmpError, GmpStatus, GmpStatusResponse};
