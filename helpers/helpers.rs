//! Common helpers for deploying Starknet contracts from scripts and tests

pub mod account;
pub mod artifacts;
pub mod calldata;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod erc1155;
pub mod error;

pub use account::{
    ContractDeployer, DeclareAndDeployRequest, DeclareAndDeployResponse, DeclareOutcome,
    DeployOutcome, PreparedClass, RpcBackend, StarknetAccount, StarknetBackend,
    TransactionState,
};
pub use artifacts::{ArtifactPaths, ContractArtifacts};
pub use calldata::{Abi, AbiEntry, AbiMember};
pub use config::DeployConfig;
pub use contract::ContractHandle;
pub use deploy::{deploy_contract, deploy_erc1155, Deployment};
pub use erc1155::Erc1155Constructor;
pub use error::{
    ArtifactError, CalldataError, ConfigError, DeployError, ErrorKind, NetworkError,
};
