//! The declare-and-deploy routine.

use log::{error, info};
use serde_json::Value;
use starknet::core::types::Felt;

use crate::{
    account::{ContractDeployer, DeclareAndDeployRequest, DeclareOutcome, DeployOutcome},
    artifacts::{ArtifactPaths, ContractArtifacts},
    calldata::format_calldata,
    contract::ContractHandle,
    erc1155::Erc1155Constructor,
    error::{DeployError, ErrorKind},
};

/// A successful deployment and a contract handle bound to the deploying account.
#[derive(Debug)]
pub struct Deployment<A> {
    pub declare: DeclareOutcome,
    pub deploy: DeployOutcome,
    pub contract: ContractHandle<A>,
}

impl<A> Deployment<A> {
    pub fn class_hash(&self) -> Felt {
        self.declare.class_hash
    }

    pub fn contract_address(&self) -> Felt {
        self.deploy.contract_address
    }
}

/// Encodes `constructor_args`, declares and deploys the class, and binds a
/// handle to the new instance. Every failure is returned to the caller.
///
/// Each call submits a fresh deployment; nothing here checks whether the
/// class or an instance already exists.
pub async fn deploy_contract<'a, D: ContractDeployer>(
    deployer: &'a D,
    artifacts: &ContractArtifacts,
    constructor_args: &Value,
) -> Result<Deployment<&'a D>, DeployError> {
    let calldata = artifacts.abi.encode_constructor(constructor_args)?;
    info!("constructor= {}", format_calldata(&calldata));

    let response = deployer
        .declare_and_deploy(DeclareAndDeployRequest {
            artifacts,
            constructor_calldata: &calldata,
        })
        .await?;

    info!("declared class hash: {:#x}", response.declare.class_hash);
    info!("deployed at address: {:#x}", response.deploy.contract_address);

    let contract =
        ContractHandle::new(artifacts.abi.clone(), response.deploy.contract_address).connect(deployer);

    Ok(Deployment {
        declare: response.declare,
        deploy: response.deploy,
        contract,
    })
}

/// Deploys `MyERC1155` with the fixed initial mint to the deploying account.
///
/// Artifact and calldata problems are returned as errors before anything is
/// sent. A network failure is logged and swallowed, yielding `Ok(None)`.
pub async fn deploy_erc1155<'a, D: ContractDeployer>(
    deployer: &'a D,
    paths: &ArtifactPaths,
) -> Result<Option<Deployment<&'a D>>, DeployError> {
    info!("Deployment Tx - ERC1155 Contract to Starknet...");
    info!("deploying from account {:#x}", deployer.address());

    let artifacts = ContractArtifacts::load(paths).await?;
    let constructor = Erc1155Constructor::initial_mint(deployer.address());

    match deploy_contract(deployer, &artifacts, &constructor.to_args()).await {
        Ok(deployment) => Ok(Some(deployment)),
        Err(err) if err.kind() == ErrorKind::Network => {
            error!("Error deploying ERC1155 contract: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
