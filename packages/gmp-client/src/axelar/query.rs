//! Axelar gas fee estimation client
//!
//! Quotes the native-token fee the source chain transaction must carry so the
//! Axelar gas service can pay for relaying and executing on the destination.

use alloy::primitives::U256;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::axelar::environment::{endpoint, AxelarEnvironment};
use crate::clients::FeeEstimator;
use crate::types::{EvmChain, GasToken};

/// Body of `POST /gmp/estimateGasFee`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateGasFeeRequest<'a> {
    source_chain: &'a str,
    destination_chain: &'a str,
    source_token_symbol: &'a str,
    gas_limit: u64,
    gas_multiplier: &'a str,
}

/// Fee estimation client for the axelarscan API
pub struct AxelarQueryClient {
    http: reqwest::Client,
    api_url: Url,
}

impl AxelarQueryClient {
    /// Create a client for the environment's default API
    pub fn new(environment: AxelarEnvironment) -> Result<Self> {
        Self::with_api_url(environment.api_url())
    }

    /// Create a client against a specific API base URL
    pub fn with_api_url(api_url: Url) -> Result<Self> {
        Ok(Self {
            http: super::http_client()?,
            api_url,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
}

#[async_trait]
impl FeeEstimator for AxelarQueryClient {
    async fn estimate_gas_fee(
        &self,
        source: EvmChain,
        destination: EvmChain,
        gas_token: GasToken,
        gas_limit: u64,
    ) -> Result<U256> {
        let url = endpoint(&self.api_url, "gmp/estimateGasFee")
            .wrap_err("Invalid fee estimation URL")?;

        let request = EstimateGasFeeRequest {
            source_chain: source.as_str(),
            destination_chain: destination.as_str(),
            source_token_symbol: gas_token.as_str(),
            gas_limit,
            gas_multiplier: "auto",
        };

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| eyre!("Fee estimation request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("Fee estimation returned HTTP {}", status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| eyre!("Invalid fee estimation response: {}", e))?;

        let fee = parse_fee_response(&body)?;
        debug!(
            source = %source,
            destination = %destination,
            gas_token = %gas_token,
            gas_limit = gas_limit,
            fee = %fee,
            "Estimated cross-chain gas fee"
        );
        Ok(fee)
    }
}

/// Extract the fee (smallest native unit) from an estimateGasFee response.
///
/// Accepts a decimal string, a JSON integer, or an object carrying either
/// under `result` or `fee`.
pub fn parse_fee_response(body: &Value) -> Result<U256> {
    match body {
        Value::String(s) => s
            .trim()
            .parse::<U256>()
            .map_err(|e| eyre!("Invalid fee amount {:?}: {}", s, e)),
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| eyre!("Fee amount is not an unsigned integer: {}", n)),
        Value::Object(map) => {
            if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                return Err(eyre!("Fee estimation error: {}", error));
            }
            map.get("result")
                .or_else(|| map.get("fee"))
                .ok_or_else(|| eyre!("Fee estimation response missing fee"))
                .and_then(parse_fee_response)
        }
        other => Err(eyre!("Unexpected fee estimation response: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_string_fee() {
        assert_eq!(
            parse_fee_response(&json!("1500000000000000")).unwrap(),
            U256::from(1_500_000_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_number_fee() {
        assert_eq!(parse_fee_response(&json!(42)).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_parse_wrapped_fee() {
        assert_eq!(
            parse_fee_response(&json!({ "result": "7" })).unwrap(),
            U256::from(7u64)
        );
        assert_eq!(
            parse_fee_response(&json!({ "fee": 9 })).unwrap(),
            U256::from(9u64)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_fee_response(&json!("abc")).is_err());
        assert!(parse_fee_response(&json!(-1)).is_err());
        assert!(parse_fee_response(&json!(null)).is_err());
        assert!(parse_fee_response(&json!({ "other": 1 })).is_err());
    }

    #[test]
    fn test_parse_reports_api_error() {
        let err = parse_fee_response(&json!({ "error": "chain not supported" })).unwrap_err();
        assert!(err.to_string().contains("chain not supported"));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = EstimateGasFeeRequest {
            source_chain: "fantom",
            destination_chain: "avalanche",
            source_token_symbol: "FTM",
            gas_limit: 150_000,
            gas_multiplier: "auto",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sourceChain"], "fantom");
        assert_eq!(value["destinationChain"], "avalanche");
        assert_eq!(value["sourceTokenSymbol"], "FTM");
        assert_eq!(value["gasLimit"], 150_000);
        assert_eq!(value["gasMultiplier"], "auto");
    }
}
