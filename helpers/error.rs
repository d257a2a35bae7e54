use std::path::PathBuf;

use starknet::{core::types::Felt, providers::ProviderError};

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

/// Coarse classification of a [`DeployError`], so callers can tell fatal
/// misconfiguration apart from failures worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ArtifactLoad,
    Calldata,
    Network,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("calldata error: {0}")]
    Calldata(#[from] CalldataError),
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Config(_) => ErrorKind::Configuration,
            DeployError::Artifact(_) => ErrorKind::ArtifactLoad,
            DeployError::Calldata(_) => ErrorKind::Calldata,
            DeployError::Network(_) => ErrorKind::Network,
        }
    }

    /// Only network failures may succeed on a second attempt. Nothing in this
    /// crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} has no abi", path.display())]
    MissingAbi { path: PathBuf },
    #[error("invalid abi in {}: {source}", path.display())]
    Abi {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} does not match the expected class schema: {source}", path.display())]
    Schema {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to prepare class from {}: {reason}", path.display())]
    Class { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CalldataError {
    #[error("abi has no constructor but arguments were given")]
    MissingConstructor,
    #[error("abi has no function named {0}")]
    MissingFunction(String),
    #[error("missing argument {0}")]
    MissingArgument(String),
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("arguments must be a json object or array")]
    ArgumentShape,
    #[error("invalid value for {ty}: {reason}")]
    InvalidValue { ty: String, reason: String },
    #[error("value does not fit in {0}")]
    Overflow(String),
    #[error("unknown variant {variant} of {ty}")]
    UnknownVariant { ty: String, variant: String },
    #[error("unsupported type {0}")]
    Unsupported(String),
    #[error("invalid function name {0}")]
    InvalidFunctionName(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("account error: {0}")]
    Account(String),
    #[error("transaction {hash:#x} reverted: {reason}")]
    Reverted { hash: Felt, reason: String },
    #[error("rejected: {0}")]
    Rejected(String),
}
