//! Axelar GMP status client
//!
//! Looks up a source-chain transaction in the axelarscan GMP index and reduces
//! the record to the three facts the bridge flow tracks: source confirmation,
//! destination approval and destination execution, plus any relayer error.

use alloy::primitives::TxHash;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::axelar::environment::{endpoint, AxelarEnvironment};
use crate::clients::GmpStatusSource;
use crate::types::{GmpError, GmpStatus, GmpStatusResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchGmpRequest {
    tx_hash: String,
}

/// GMP status client for the axelarscan API
pub struct AxelarRecoveryClient {
    http: reqwest::Client,
    api_url: Url,
}

impl AxelarRecoveryClient {
    pub fn new(environment: AxelarEnvironment) -> Result<Self> {
        Self::with_api_url(environment.api_url())
    }

    pub fn with_api_url(api_url: Url) -> Result<Self> {
        Ok(Self {
            http: super::http_client()?,
            api_url,
        })
    }
}

#[async_trait]
impl GmpStatusSource for AxelarRecoveryClient {
    async fn query_transaction_status(&self, tx_hash: TxHash) -> Result<GmpStatusResponse> {
        let url = endpoint(&self.api_url, "gmp/searchGMP").wrap_err("Invalid GMP search URL")?;

        let response = self
            .http
            .post(url)
            .json(&SearchGmpRequest {
                tx_hash: format!("{:#x}", tx_hash),
            })
            .send()
            .await
            .map_err(|e| eyre!("GMP status request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("GMP status returned HTTP {}", status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| eyre!("Invalid GMP status response: {}", e))?;

        let parsed = parse_search_response(tx_hash, &body)?;
        debug!(
            tx_hash = %tx_hash,
            status = %parsed.status,
            approved = parsed.approved,
            executed = parsed.executed,
            has_error = parsed.error.is_some(),
            "Queried GMP status"
        );
        Ok(parsed)
    }
}

/// Reduce a `searchGMP` response to a [`GmpStatusResponse`].
///
/// An empty `data` array means the relayer has not indexed the transaction yet
/// and yields `cannot_fetch_status` without an error.
pub fn parse_search_response(tx_hash: TxHash, body: &Value) -> Result<GmpStatusResponse> {
    let records = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| eyre!("GMP status response missing data array"))?;

    let Some(record) = records.first() else {
        return Ok(GmpStatusResponse::not_found(tx_hash));
    };

    let status = record
        .get("status")
        .and_then(Value::as_str)
        .map(GmpStatus::from_wire)
        .unwrap_or(GmpStatus::Unknown);

    let approved = is_present(record.get("approved"));
    let executed = is_present(record.get("executed"));

    let error = extract_error(record).or_else(|| {
        let insufficient = record
            .get("is_insufficient_fee")
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || status == GmpStatus::InsufficientFee;
        (insufficient && !executed).then(|| GmpError {
            message: "Insufficient gas fee paid for relaying".to_string(),
        })
    });

    Ok(GmpStatusResponse {
        tx_hash,
        status,
        approved,
        executed,
        error,
    })
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

fn extract_error(record: &Value) -> Option<GmpError> {
    let error = record.get("error").filter(|e| !e.is_null())?;

    let message = match error {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| {
                error
                    .get("error")
                    .and_then(|inner| inner.get("message"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
            .or_else(|| Some(error.to_string())),
        other => Some(other.to_string()),
    }?;

    Some(GmpError { message })
}
