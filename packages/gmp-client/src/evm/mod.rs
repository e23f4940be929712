//! EVM Chain Support Module
//!
//! alloy-backed implementations of the wallet and balance client seams for the
//! CHOM token contracts.
//!
//! ## Submodules
//!
//! - `contracts` - ERC20 and ChomToken bindings using alloy sol! macro
//! - `client` - Signing wallet client (approve, bridge, receipt wait)
//! - `balances` - Read-only multi-chain balance reader

pub mod balances;
pub mod client;
pub mod contracts;

// Re-export commonly used items
pub use balances::EvmBalanceReader;
pub use client::{EvmWalletClient, ReceiptPolling};
pub use contracts::{ChomToken, ERC20};
