//! Common types for Axelar GMP operations
//!
//! Chain and gas-token identifiers in the form the Axelar APIs expect, and the
//! relayer status returned for a bridged transaction.

use alloy::primitives::TxHash;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Chain / Gas Token Identifiers
// ============================================================================

/// Axelar chain identifier for an EVM chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvmChain {
    Fantom,
    Avalanche,
}

impl EvmChain {
    /// Identifier used in Axelar API requests
    pub fn as_str(&self) -> &'static str {
        match self {
            EvmChain::Fantom => "fantom",
            EvmChain::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for EvmChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EvmChain {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fantom" => Ok(EvmChain::Fantom),
            "avalanche" => Ok(EvmChain::Avalanche),
            other => Err(eyre!("Unknown Axelar chain: {}", other)),
        }
    }
}

/// Native gas token symbol of a source chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GasToken {
    Ftm,
    Avax,
}

impl GasToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            GasToken::Ftm => "FTM",
            GasToken::Avax => "AVAX",
        }
    }
}

impl fmt::Display for GasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GMP Status
// ============================================================================

/// Relayer lifecycle status of a GMP call
///
/// Ordered roughly by progress; error-like statuses sit outside the ordering
/// and never count as source confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GmpStatus {
    SourceGatewayCalled,
    #[serde(rename = "confirmed")]
    SourceGatewayConfirmed,
    Approving,
    DestinationGatewayApproved,
    Executing,
    DestinationExecuted,
    ExpressExecuted,
    #[serde(rename = "error")]
    DestinationExecuteError,
    InsufficientFee,
    NotExecuted,
    CannotFetchStatus,
    Unknown,
}

impl GmpStatus {
    /// Wire string used by the relayer API
    pub fn as_str(&self) -> &'static str {
        match self {
            GmpStatus::SourceGatewayCalled => "source_gateway_called",
            GmpStatus::SourceGatewayConfirmed => "confirmed",
            GmpStatus::Approving => "approving",
            GmpStatus::DestinationGatewayApproved => "destination_gateway_approved",
            GmpStatus::Executing => "executing",
            GmpStatus::DestinationExecuted => "destination_executed",
            GmpStatus::ExpressExecuted => "express_executed",
            GmpStatus::DestinationExecuteError => "error",
            GmpStatus::InsufficientFee => "insufficient_fee",
            GmpStatus::NotExecuted => "not_executed",
            GmpStatus::CannotFetchStatus => "cannot_fetch_status",
            GmpStatus::Unknown => "unknown",
        }
    }

    /// Parse a relayer status string.
    ///
    /// Accepts both the SDK spelling and the raw axelarscan spelling
    /// (`called`, `approved`, `executed`). Unrecognised strings map to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "source_gateway_called" | "called" => GmpStatus::SourceGatewayCalled,
            "confirmed" | "source_gateway_confirmed" => GmpStatus::SourceGatewayConfirmed,
            "approving" => GmpStatus::Approving,
            "destination_gateway_approved" | "approved" => GmpStatus::DestinationGatewayApproved,
            "executing" => GmpStatus::Executing,
            "destination_executed" | "executed" => GmpStatus::DestinationExecuted,
            "express_executed" => GmpStatus::ExpressExecuted,
            "error" | "destination_execute_error" => GmpStatus::DestinationExecuteError,
            "insufficient_fee" => GmpStatus::InsufficientFee,
            "not_executed" => GmpStatus::NotExecuted,
            "cannot_fetch_status" => GmpStatus::CannotFetchStatus,
            _ => GmpStatus::Unknown,
        }
    }

    /// True once validators have confirmed the source gateway call.
    pub fn is_source_confirmed(&self) -> bool {
        matches!(
            self,
            GmpStatus::SourceGatewayConfirmed
                | GmpStatus::Approving
                | GmpStatus::DestinationGatewayApproved
                | GmpStatus::Executing
                | GmpStatus::DestinationExecuted
                | GmpStatus::ExpressExecuted
        )
    }
}

impl fmt::Display for GmpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relayer-reported failure for a GMP call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmpError {
    pub message: String,
}

/// Status of a bridged transaction as reported by the relayer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmpStatusResponse {
    /// Source transaction the status belongs to
    pub tx_hash: TxHash,
    pub status: GmpStatus,
    /// Message approved on the destination gateway
    pub approved: bool,
    /// Message executed on the destination contract
    pub executed: bool,
    pub error: Option<GmpError>,
}

impl GmpStatusResponse {
    /// Response for a transaction the relayer has not indexed yet
    pub fn not_found(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            status: GmpStatus::CannotFetchStatus,
            approved: false,
            executed: false,
            error: None,
        }
    }

    pub fn is_source_confirmed(&self) -> bool {
        self.status.is_source_confirmed()
    }
}
