//! Axelar network environment selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Which Axelar network the bridge talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxelarEnvironment {
    #[default]
    Testnet,
    Mainnet,
}

/// Returned when an environment name is neither `testnet` nor `mainnet`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown Axelar environment: {0} (expected testnet or mainnet)")]
pub struct UnknownEnvironment(pub String);

impl AxelarEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxelarEnvironment::Testnet => "testnet",
            AxelarEnvironment::Mainnet => "mainnet",
        }
    }

    /// Base URL of the axelarscan API (fee estimation and GMP search)
    pub fn api_url(&self) -> Url {
        let raw = match self {
            AxelarEnvironment::Testnet => "https://testnet.api.axelarscan.io",
            AxelarEnvironment::Mainnet => "https://api.axelarscan.io",
        };
        Url::parse(raw).expect("constant URL is valid")
    }

    /// Base URL of the axelarscan explorer (user-facing GMP links)
    pub fn explorer_url(&self) -> Url {
        let raw = match self {
            AxelarEnvironment::Testnet => "https://testnet.axelarscan.io",
            AxelarEnvironment::Mainnet => "https://axelarscan.io",
        };
        Url::parse(raw).expect("constant URL is valid")
    }
}

impl fmt::Display for AxelarEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxelarEnvironment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(AxelarEnvironment::Testnet),
            "mainnet" => Ok(AxelarEnvironment::Mainnet),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

/// Join an API path onto a base URL, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}
