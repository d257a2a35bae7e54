//! Test doubles and fixtures for deployment tests

use std::{path::PathBuf, sync::Mutex};

use helpers::{
    ArtifactPaths, ContractDeployer, DeclareAndDeployRequest, DeclareAndDeployResponse,
    DeclareOutcome, DeployError, DeployOutcome, NetworkError,
};
use starknet::core::types::Felt;

/// How a [`MockAccount`] answers declare-and-deploy requests.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeeds with `class_hash`. Only the first submission declares; the
    /// n-th deployment (from zero) lands at `first_address + n`.
    Succeed { class_hash: Felt, first_address: Felt },
    Reject(String),
}

/// An account that records every submission instead of talking to a node.
#[derive(Debug)]
pub struct MockAccount {
    address: Felt,
    outcome: MockOutcome,
    submissions: Mutex<Vec<Vec<Felt>>>,
}

impl MockAccount {
    pub fn new(address: Felt, outcome: MockOutcome) -> Self {
        Self {
            address,
            outcome,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(address: Felt, class_hash: Felt, first_address: Felt) -> Self {
        Self::new(
            address,
            MockOutcome::Succeed {
                class_hash,
                first_address,
            },
        )
    }

    pub fn rejecting(address: Felt, message: impl Into<String>) -> Self {
        Self::new(address, MockOutcome::Reject(message.into()))
    }

    /// Constructor calldata of every submission, in order.
    pub fn submissions(&self) -> Vec<Vec<Felt>> {
        self.submissions.lock().unwrap().clone()
    }
}

impl ContractDeployer for MockAccount {
    fn address(&self) -> Felt {
        self.address
    }

    async fn declare_and_deploy(
        &self,
        request: DeclareAndDeployRequest<'_>,
    ) -> Result<DeclareAndDeployResponse, DeployError> {
        let index = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(request.constructor_calldata.to_vec());
            submissions.len() as u64 - 1
        };

        match &self.outcome {
            MockOutcome::Succeed {
                class_hash,
                first_address,
            } => Ok(DeclareAndDeployResponse {
                declare: DeclareOutcome {
                    transaction_hash: (index == 0).then(|| Felt::from(0xd0_u64)),
                    class_hash: *class_hash,
                },
                deploy: DeployOutcome {
                    transaction_hash: Felt::from(0xe0 + index),
                    contract_address: *first_address + Felt::from(index),
                },
            }),
            MockOutcome::Reject(message) => Err(NetworkError::Rejected(message.clone()).into()),
        }
    }
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Paths of the checked-in MyERC1155 artifacts.
pub fn erc1155_fixture_paths() -> ArtifactPaths {
    let dir = fixtures_dir();
    ArtifactPaths::new(
        dir.join("morning_star_MyERC1155.contract_class.json"),
        dir.join("morning_star_MyERC1155.compiled_contract_class.json"),
    )
}
