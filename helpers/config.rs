//! Deployment configuration read from the process environment.

use std::fmt;

use starknet::core::{chain_id, types::Felt, utils::cairo_short_string_to_felt};
use url::Url;

use crate::{artifacts::ArtifactPaths, error::ConfigError};

pub const PRIVATE_KEY_VAR: &str = "STARKNET_PRIVATE_KEY";
pub const ACCOUNT_ADDRESS_VAR: &str = "STARKNET_ACCOUNT_ADDRESS";
pub const RPC_URL_VAR: &str = "STARKNET_RPC_URL";
pub const CHAIN_ID_VAR: &str = "STARKNET_CHAIN_ID";

/// Public Starknet Sepolia JSON-RPC endpoint.
pub const SEPOLIA_RPC_URL: &str = "https://starknet-sepolia.public.blastapi.io/rpc/v0_8";

/// Everything the deployment routine needs, passed in explicitly rather than
/// read from the environment at the point of use.
#[derive(Clone)]
pub struct DeployConfig {
    pub rpc_url: Url,
    pub chain_id: Felt,
    pub private_key: Felt,
    pub account_address: Felt,
    pub artifacts: ArtifactPaths,
}

impl DeployConfig {
    /// Reads the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let private_key = parse_felt(PRIVATE_KEY_VAR, required(&lookup, PRIVATE_KEY_VAR)?)?;
        let account_address =
            parse_felt(ACCOUNT_ADDRESS_VAR, required(&lookup, ACCOUNT_ADDRESS_VAR)?)?;

        let rpc_url = optional(&lookup, RPC_URL_VAR).unwrap_or_else(|| SEPOLIA_RPC_URL.to_string());
        let rpc_url = Url::parse(&rpc_url).map_err(|e| ConfigError::Invalid {
            name: RPC_URL_VAR,
            reason: e.to_string(),
        })?;

        let chain_id = match optional(&lookup, CHAIN_ID_VAR) {
            Some(name) => cairo_short_string_to_felt(&name).map_err(|e| ConfigError::Invalid {
                name: CHAIN_ID_VAR,
                reason: e.to_string(),
            })?,
            None => chain_id::SEPOLIA,
        };

        Ok(Self {
            rpc_url,
            chain_id,
            private_key,
            account_address,
            artifacts: ArtifactPaths::default(),
        })
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &format_args!("{:#x}", self.chain_id))
            .field("private_key", &"<redacted>")
            .field("account_address", &format_args!("{:#x}", self.account_address))
            .field("artifacts", &self.artifacts)
            .finish()
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

fn parse_felt(name: &'static str, value: String) -> Result<Felt, ConfigError> {
    Felt::from_hex(&value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_credentials_with_sepolia_defaults() {
        let config = DeployConfig::from_lookup(lookup(&[
            (PRIVATE_KEY_VAR, "0x1234"),
            (ACCOUNT_ADDRESS_VAR, "0xabc"),
        ]))
        .unwrap();

        assert_eq!(config.private_key, Felt::from(0x1234_u64));
        assert_eq!(config.account_address, Felt::from(0xabc_u64));
        assert_eq!(config.rpc_url.as_str(), SEPOLIA_RPC_URL);
        assert_eq!(config.chain_id, chain_id::SEPOLIA);
        assert_eq!(config.artifacts, ArtifactPaths::default());
    }

    #[test]
    fn missing_private_key_is_reported() {
        let err = DeployConfig::from_lookup(lookup(&[(ACCOUNT_ADDRESS_VAR, "0xabc")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(PRIVATE_KEY_VAR)));
    }

    #[test]
    fn blank_account_address_counts_as_missing() {
        let err = DeployConfig::from_lookup(lookup(&[
            (PRIVATE_KEY_VAR, "0x1"),
            (ACCOUNT_ADDRESS_VAR, "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ACCOUNT_ADDRESS_VAR)));
    }

    #[test]
    fn rejects_non_hex_address() {
        let err = DeployConfig::from_lookup(lookup(&[
            (PRIVATE_KEY_VAR, "0x1"),
            (ACCOUNT_ADDRESS_VAR, "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: ACCOUNT_ADDRESS_VAR,
                ..
            }
        ));
    }

    #[test]
    fn custom_rpc_url_and_chain_id() {
        let config = DeployConfig::from_lookup(lookup(&[
            (PRIVATE_KEY_VAR, "0x1"),
            (ACCOUNT_ADDRESS_VAR, "0x2"),
            (RPC_URL_VAR, "http://127.0.0.1:5050/rpc"),
            (CHAIN_ID_VAR, "SN_MAIN"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:5050/rpc");
        assert_eq!(config.chain_id, chain_id::MAINNET);
    }

    #[test]
    fn debug_output_hides_private_key() {
        let config = DeployConfig::from_lookup(lookup(&[
            (PRIVATE_KEY_VAR, "0xdeadbeef"),
            (ACCOUNT_ADDRESS_VAR, "0x2"),
        ]))
        .unwrap();

        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("deadbeef"));
    }
}
