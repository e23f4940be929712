//! CHOM Bridge - Library interface
//!
//! Bridges the CHOM token between Fantom and Avalanche over Axelar GMP.
//! [`flow::BridgeFlow`] drives one attempt through approve, lock and relayer
//! tracking; [`balance::BalanceView`] reads balances on both chains.

pub mod amount;
pub mod balance;
pub mod chains;
pub mod config;
pub mod error;
pub mod events;
pub mod flow;
pub mod poller;
pub mod retry;
pub mod state;

pub use amount::BridgeAmount;
pub use balance::{BalanceDisplay, BalanceView};
pub use chains::{ChainInfo, ChainPair, ChainRegistry};
pub use error::{Action, FlowError};
pub use events::{FlowEvent, Notice, NoticeLevel, ResetReason};
pub use flow::{BridgeClients, BridgeFlow, FlowConfig};
pub use state::{BridgeState, BridgeStep, BridgeTransaction};
