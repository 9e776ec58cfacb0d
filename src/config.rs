//! Environment-driven configuration
//!
//! - `BOUNTY_BOARD_RPC_URL` (or `RPC_URL`) - JSON-RPC endpoint, http(s)/ws(s)
//! - `BOUNTY_BOARD_CONTRACT` - bounty board contract address
//! - `BOUNTY_BOARD_PRIVATE_KEY` - signing key for the local wallet
//! - `BOUNTY_BOARD_CHAIN_ID` - chain id (default: 11155111)
//! - `PINATA_JWT` - pinning service token
//! - `PINATA_API_URL` - pinning API base (default: https://api.pinata.cloud)
//! - `PINATA_GATEWAY` - gateway base (default: https://gateway.pinata.cloud)
//! - `BOUNTY_BOARD_CONFIRMATION_DELAY_MS` - hold on `confirmed` (default: 1500)
//! - `BOUNTY_BOARD_SUCCESS_DELAY_MS` - delay before the post-success action (default: 2000)

use std::time::Duration;

use alloy::primitives::Address;
use url::Url;

use crate::infra::{BountyError, Result};

pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_PINATA_GATEWAY: &str = "https://gateway.pinata.cloud";

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_non_empty(key)
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

/// Validate an RPC URL. Only http, https, ws and wss are accepted.
pub fn validate_rpc_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| BountyError::Configuration(format!("invalid RPC URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        scheme => Err(BountyError::Configuration(format!(
            "unsupported RPC URL scheme '{scheme}'. Only http, https, ws, wss are allowed"
        ))),
    }
}

/// Chain connection settings
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    pub private_key: String,
    pub chain_id: u64,
}

impl ChainConfig {
    /// Load from the environment; `Ok(None)` when a required variable is
    /// missing, an error when one is set but malformed
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(rpc_url) = var("BOUNTY_BOARD_RPC_URL").or_else(|| var("RPC_URL")) else {
            return Ok(None);
        };
        let Some(contract) = var("BOUNTY_BOARD_CONTRACT") else {
            return Ok(None);
        };
        let Some(private_key) = var("BOUNTY_BOARD_PRIVATE_KEY") else {
            return Ok(None);
        };

        let contract_address = contract.trim().parse::<Address>().map_err(|e| {
            BountyError::Configuration(format!(
                "BOUNTY_BOARD_CONTRACT '{contract}' is not an address: {e}"
            ))
        })?;
        let chain_id = match var("BOUNTY_BOARD_CHAIN_ID") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                BountyError::Configuration(format!("BOUNTY_BOARD_CHAIN_ID '{raw}': {e}"))
            })?,
            None => DEFAULT_CHAIN_ID,
        };

        Ok(Some(Self {
            rpc_url,
            contract_address,
            private_key,
            chain_id,
        }))
    }

    pub fn require_from_env() -> Result<Self> {
        Self::from_env()?.ok_or_else(|| {
            BountyError::Configuration(
                "BOUNTY_BOARD_RPC_URL, BOUNTY_BOARD_CONTRACT and BOUNTY_BOARD_PRIVATE_KEY are required"
                    .to_string(),
            )
        })
    }
}

/// Pinning service settings
#[derive(Debug, Clone)]
pub struct PinataConfig {
    pub jwt: String,
    pub api_url: String,
    pub gateway_url: String,
}

impl PinataConfig {
    pub fn new(jwt: impl Into<String>) -> Self {
        Self {
            jwt: jwt.into(),
            api_url: DEFAULT_PINATA_API_URL.to_string(),
            gateway_url: DEFAULT_PINATA_GATEWAY.to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let jwt = env_non_empty("PINATA_JWT")?;
        Some(Self {
            jwt,
            api_url: env_non_empty("PINATA_API_URL")
                .unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string()),
            gateway_url: env_non_empty("PINATA_GATEWAY")
                .unwrap_or_else(|| DEFAULT_PINATA_GATEWAY.to_string()),
        })
    }
}

/// Display delays used by the flows
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long `confirmed` is held before the flow proceeds
    pub confirmation_delay: Duration,
    /// Pause between success and the post-success action
    pub success_delay: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            confirmation_delay: Duration::from_millis(1500),
            success_delay: Duration::from_millis(2000),
        }
    }
}

impl LifecycleConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            confirmation_delay: env_millis("BOUNTY_BOARD_CONFIRMATION_DELAY_MS")
                .unwrap_or(defaults.confirmation_delay),
            success_delay: env_millis("BOUNTY_BOARD_SUCCESS_DELAY_MS")
                .unwrap_or(defaults.success_delay),
        }
    }

    /// No delays; for tests and non-interactive use
    pub fn immediate() -> Self {
        Self {
            confirmation_delay: Duration::ZERO,
            success_delay: Duration::ZERO,
        }
    }
}
