//! Testing Utilities Module
//!
//! Scripted fakes for every client seam so bridge flows can be driven
//! deterministically without a chain or the Axelar APIs.
//!
//! ## Submodules
//!
//! - `fakes` - `FakeChainWriter`, `FakeFeeEstimator`, `ScriptedStatusSource`,
//!   `FakeBalanceReader`

pub mod fakes;

// Re-export commonly used items
pub use fakes::*;
