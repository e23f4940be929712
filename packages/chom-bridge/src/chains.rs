//! Chain registry for the two CHOM deployments
//!
//! Exactly two chains are known. Whichever one the wallet is connected to is
//! the source; the other is always the destination.

use alloy::primitives::{address, Address};
use gmp_client::types::{EvmChain, GasToken};
use serde::Serialize;

use crate::error::FlowError;

/// A chain the CHOM token is deployed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    /// Native EVM chain ID
    pub chain_id: u64,
    pub display_name: &'static str,
    pub logo: &'static str,
    /// CHOM token contract; also the bridge contract
    pub token_address: Address,
    /// Identifier used by the Axelar APIs
    pub axelar_chain: EvmChain,
    /// Native gas token paid for relaying when this chain is the source
    pub gas_token: GasToken,
    /// Destination name passed to the token's `bridge` call
    pub bridge_destination_name: &'static str,
}

impl ChainInfo {
    /// Spender of the allowance and target of the lock transaction
    pub fn bridge_address(&self) -> Address {
        self.token_address
    }
}

pub const FANTOM_TESTNET_CHAIN_ID: u64 = 4002;
pub const AVALANCHE_FUJI_CHAIN_ID: u64 = 43113;

/// Source/destination selection over the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainPair {
    pub source: ChainInfo,
    pub destination: ChainInfo,
}

impl ChainPair {
    pub fn source_chain_id(&self) -> u64 {
        self.source.chain_id
    }

    pub fn dest_chain_id(&self) -> u64 {
        self.destination.chain_id
    }

    /// The same pair with source and destination swapped
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }
}

/// The fixed two-chain registry
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: [ChainInfo; 2],
}

impl ChainRegistry {
    /// Fantom testnet and Avalanche Fuji deployments
    pub fn testnet() -> Self {
        Self {
            chains: [
                ChainInfo {
                    chain_id: FANTOM_TESTNET_CHAIN_ID,
                    display_name: "Fantom",
                    logo: "fantom.png",
                    token_address: address!("27C98368f32dD546554e44771bf9F6ccE08ee450"),
                    axelar_chain: EvmChain::Fantom,
                    gas_token: GasToken::Ftm,
                    bridge_destination_name: "Fantom",
                },
                ChainInfo {
                    chain_id: AVALANCHE_FUJI_CHAIN_ID,
                    display_name: "Avalanche",
                    logo: "avalanche.png",
                    token_address: address!("599FA7Fd565cE93290b05B8106955d434A995124"),
                    axelar_chain: EvmChain::Avalanche,
                    gas_token: GasToken::Avax,
                    bridge_destination_name: "Avalanche",
                },
            ],
        }
    }

    pub fn chains(&self) -> &[ChainInfo] {
        &self.chains
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainInfo> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Pair with `source_chain_id` as source and the other chain as destination
    pub fn pair(&self, source_chain_id: u64) -> Result<ChainPair, FlowError> {
        let source = self
            .get(source_chain_id)
            .ok_or(FlowError::UnsupportedChain(source_chain_id))?;
        let destination = self
            .chains
            .iter()
            .find(|c| c.chain_id != source_chain_id)
            .ok_or(FlowError::UnsupportedChain(source_chain_id))?;

        Ok(ChainPair {
            source: source.clone(),
            destination: destination.clone(),
        })
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::testnet()
    }
}
