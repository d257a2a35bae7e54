//! Loading of compiled contract artifacts.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{calldata::Abi, error::ArtifactError};

pub const ERC1155_SIERRA_PATH: &str = "./target/dev/morning_star_MyERC1155.contract_class.json";
pub const ERC1155_CASM_PATH: &str =
    "./target/dev/morning_star_MyERC1155.compiled_contract_class.json";

/// Locations of the Sierra contract class and its CASM compiled class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub sierra: PathBuf,
    pub casm: PathBuf,
}

impl ArtifactPaths {
    pub fn new(sierra: impl Into<PathBuf>, casm: impl Into<PathBuf>) -> Self {
        Self {
            sierra: sierra.into(),
            casm: casm.into(),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(ERC1155_SIERRA_PATH, ERC1155_CASM_PATH)
    }
}

/// The artifact pair as read from disk. Both documents are kept verbatim;
/// only the ABI is parsed up front since constructor encoding needs it.
#[derive(Debug, Clone)]
pub struct ContractArtifacts {
    pub paths: ArtifactPaths,
    pub sierra: Value,
    pub casm: Value,
    pub abi: Abi,
}

impl ContractArtifacts {
    pub async fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let sierra = read_json(&paths.sierra).await?;
        let casm = read_json(&paths.casm).await?;
        let abi = match sierra.get("abi") {
            Some(abi) => Abi::from_value(abi).map_err(|source| ArtifactError::Abi {
                path: paths.sierra.clone(),
                source,
            })?,
            None => {
                return Err(ArtifactError::MissingAbi {
                    path: paths.sierra.clone(),
                })
            }
        };

        Ok(Self {
            paths: paths.clone(),
            sierra,
            casm,
            abi,
        })
    }
}

async fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
