//! The account seam: the one capability the deployment routine needs from
//! the network, plus its starknet-rs implementation.

use std::{future::Future, sync::Arc, time::Duration};

use log::{debug, info};
use rand::RngCore;
use starknet::{
    accounts::{Account, ConnectedAccount, ExecutionEncoding, SingleOwnerAccount},
    contract::ContractFactory,
    core::types::{
        contract::{CompiledClass, SierraClass},
        BlockId, BlockTag, ExecutionResult, Felt, FlattenedSierraClass, StarknetError,
        TransactionStatus,
    },
    providers::{jsonrpc::HttpTransport, JsonRpcClient, Provider, ProviderError},
    signers::{LocalWallet, SigningKey},
};

use crate::{
    artifacts::ContractArtifacts,
    config::DeployConfig,
    error::{ArtifactError, DeployError, NetworkError},
};

/// Default delay between status lookups while waiting for acceptance.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct DeclareAndDeployRequest<'a> {
    pub artifacts: &'a ContractArtifacts,
    pub constructor_calldata: &'a [Felt],
}

/// `transaction_hash` is `None` when the class was already declared and no
/// declare transaction was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclareOutcome {
    pub transaction_hash: Option<Felt>,
    pub class_hash: Felt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOutcome {
    pub transaction_hash: Felt,
    pub contract_address: Felt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclareAndDeployResponse {
    pub declare: DeclareOutcome,
    pub deploy: DeployOutcome,
}

/// An account able to declare a class and deploy an instance of it in one go.
pub trait ContractDeployer {
    fn address(&self) -> Felt;

    fn declare_and_deploy(
        &self,
        request: DeclareAndDeployRequest<'_>,
    ) -> impl Future<Output = Result<DeclareAndDeployResponse, DeployError>> + Send;
}

/// A Sierra class ready to declare: flattened, with both hashes computed.
#[derive(Debug, Clone)]
pub struct PreparedClass {
    pub class: Arc<FlattenedSierraClass>,
    pub class_hash: Felt,
    pub compiled_class_hash: Felt,
}

impl PreparedClass {
    pub fn from_artifacts(artifacts: &ContractArtifacts) -> Result<Self, ArtifactError> {
        let sierra_path = &artifacts.paths.sierra;
        let casm_path = &artifacts.paths.casm;

        let sierra: SierraClass =
            serde_json::from_value(artifacts.sierra.clone()).map_err(|source| {
                ArtifactError::Schema {
                    path: sierra_path.clone(),
                    source,
                }
            })?;
        let casm: CompiledClass =
            serde_json::from_value(artifacts.casm.clone()).map_err(|source| {
                ArtifactError::Schema {
                    path: casm_path.clone(),
                    source,
                }
            })?;

        let class = sierra.flatten().map_err(|e| ArtifactError::Class {
            path: sierra_path.clone(),
            reason: e.to_string(),
        })?;
        let compiled_class_hash = casm.class_hash().map_err(|e| ArtifactError::Class {
            path: casm_path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            class_hash: class.class_hash(),
            class: Arc::new(class),
            compiled_class_hash,
        })
    }
}

/// Where a submitted transaction stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// Unknown to the node yet, or received but not in a block.
    Pending,
    Rejected(String),
    Succeeded,
    Reverted(String),
}

/// Node operations a [`StarknetAccount`] is built from.
pub trait StarknetBackend: Sync {
    fn address(&self) -> Felt;

    fn is_declared(
        &self,
        class_hash: Felt,
    ) -> impl Future<Output = Result<bool, NetworkError>> + Send;

    fn declare(
        &self,
        class: &PreparedClass,
    ) -> impl Future<Output = Result<DeclareOutcome, NetworkError>> + Send;

    fn deploy(
        &self,
        class_hash: Felt,
        constructor_calldata: Vec<Felt>,
        salt: Felt,
    ) -> impl Future<Output = Result<DeployOutcome, NetworkError>> + Send;

    fn transaction_state(
        &self,
        transaction_hash: Felt,
    ) -> impl Future<Output = Result<TransactionState, NetworkError>> + Send;
}

type RpcAccount = SingleOwnerAccount<JsonRpcClient<HttpTransport>, LocalWallet>;

/// A single-owner account talking JSON-RPC to a Starknet node.
pub struct RpcBackend {
    account: RpcAccount,
}

impl RpcBackend {
    pub fn new(config: &DeployConfig) -> Self {
        let provider = JsonRpcClient::new(HttpTransport::new(config.rpc_url.clone()));
        let signer = LocalWallet::from(SigningKey::from_secret_scalar(config.private_key));
        let account = SingleOwnerAccount::new(
            provider,
            signer,
            config.account_address,
            config.chain_id,
            ExecutionEncoding::New,
        );
        Self { account }
    }
}

impl StarknetBackend for RpcBackend {
    fn address(&self) -> Felt {
        self.account.address()
    }

    async fn is_declared(&self, class_hash: Felt) -> Result<bool, NetworkError> {
        match self
            .account
            .provider()
            .get_class(BlockId::Tag(BlockTag::Latest), class_hash)
            .await
        {
            Ok(_) => Ok(true),
            Err(ProviderError::StarknetError(StarknetError::ClassHashNotFound)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn declare(&self, class: &PreparedClass) -> Result<DeclareOutcome, NetworkError> {
        let declared = self
            .account
            .declare_v3(class.class.clone(), class.compiled_class_hash)
            .send()
            .await
            .map_err(|e| NetworkError::Account(e.to_string()))?;

        Ok(DeclareOutcome {
            transaction_hash: Some(declared.transaction_hash),
            class_hash: declared.class_hash,
        })
    }

    async fn deploy(
        &self,
        class_hash: Felt,
        constructor_calldata: Vec<Felt>,
        salt: Felt,
    ) -> Result<DeployOutcome, NetworkError> {
        let factory = ContractFactory::new(class_hash, &self.account);
        let deployment = factory.deploy_v3(constructor_calldata, salt, true);
        let contract_address = deployment.deployed_address();
        let deployed = deployment
            .send()
            .await
            .map_err(|e| NetworkError::Account(e.to_string()))?;

        Ok(DeployOutcome {
            transaction_hash: deployed.transaction_hash,
            contract_address,
        })
    }

    async fn transaction_state(
        &self,
        transaction_hash: Felt,
    ) -> Result<TransactionState, NetworkError> {
        let provider = self.account.provider();
        let status = match provider.get_transaction_status(transaction_hash).await {
            Ok(status) => status,
            Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => {
                return Ok(TransactionState::Pending)
            }
            Err(err) => return Err(err.into()),
        };

        match status {
            TransactionStatus::Received { .. } => Ok(TransactionState::Pending),
            TransactionStatus::Rejected { .. } => Ok(TransactionState::Rejected(format!(
                "transaction {transaction_hash:#x} was rejected by the sequencer"
            ))),
            _ => {
                let receipt = provider.get_transaction_receipt(transaction_hash).await?;
                Ok(match receipt.receipt.execution_result() {
                    ExecutionResult::Succeeded => TransactionState::Succeeded,
                    ExecutionResult::Reverted { reason } => {
                        TransactionState::Reverted(reason.clone())
                    }
                })
            }
        }
    }
}

/// Declares a class unless the node already knows it, then deploys it
/// through the Universal Deployer and waits for each transaction.
pub struct StarknetAccount<B = RpcBackend> {
    backend: B,
    poll_interval: Duration,
}

impl StarknetAccount {
    pub fn new(config: &DeployConfig) -> Self {
        Self::with_backend(RpcBackend::new(config))
    }
}

impl<B> StarknetAccount<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: StarknetBackend> StarknetAccount<B> {
    pub async fn deploy_prepared(
        &self,
        class: &PreparedClass,
        constructor_calldata: &[Felt],
    ) -> Result<DeclareAndDeployResponse, NetworkError> {
        let declare = if self.backend.is_declared(class.class_hash).await? {
            info!("class {:#x} already declared, skipping declare", class.class_hash);
            DeclareOutcome {
                transaction_hash: None,
                class_hash: class.class_hash,
            }
        } else {
            let declared = self.backend.declare(class).await?;
            if let Some(transaction_hash) = declared.transaction_hash {
                info!(
                    "declare transaction {transaction_hash:#x} sent for class {:#x}",
                    declared.class_hash
                );
                self.wait_for_acceptance(transaction_hash).await?;
            }
            declared
        };

        let deploy = self
            .backend
            .deploy(declare.class_hash, constructor_calldata.to_vec(), random_salt())
            .await?;
        info!("deploy transaction {:#x} sent", deploy.transaction_hash);
        self.wait_for_acceptance(deploy.transaction_hash).await?;

        Ok(DeclareAndDeployResponse { declare, deploy })
    }

    /// Polls until the transaction is accepted, rejected or reverted. There
    /// is no overall timeout; the transport's own request timeout is the
    /// only bound.
    async fn wait_for_acceptance(&self, transaction_hash: Felt) -> Result<(), NetworkError> {
        loop {
            match self.backend.transaction_state(transaction_hash).await? {
                TransactionState::Succeeded => return Ok(()),
                TransactionState::Rejected(reason) => return Err(NetworkError::Rejected(reason)),
                TransactionState::Reverted(reason) => {
                    return Err(NetworkError::Reverted {
                        hash: transaction_hash,
                        reason,
                    })
                }
                TransactionState::Pending => {
                    debug!("transaction {transaction_hash:#x} pending, retrying");
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl<B: StarknetBackend> ContractDeployer for StarknetAccount<B> {
    fn address(&self) -> Felt {
        self.backend.address()
    }

    async fn declare_and_deploy(
        &self,
        request: DeclareAndDeployRequest<'_>,
    ) -> Result<DeclareAndDeployResponse, DeployError> {
        let class = PreparedClass::from_artifacts(request.artifacts)?;
        Ok(self
            .deploy_prepared(&class, request.constructor_calldata)
            .await?)
    }
}

/// Salts stay below 2^248 so they are always valid felts.
fn random_salt() -> Felt {
    let mut salt = [0_u8; 31];
    rand::rng().fill_bytes(&mut salt);
    Felt::from_bytes_be_slice(&salt)
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use starknet::core::types::EntryPointsByType;

    use super::*;
    use crate::error::ErrorKind;

    const CLASS_HASH: u64 = 0x1234;
    const DECLARE_TX: u64 = 0xd0;
    const DEPLOY_TX: u64 = 0xe0;

    /// Answers from a script: whether the class exists, and the states
    /// reported for each transaction in order (`Succeeded` once exhausted).
    struct ScriptedBackend {
        declared: bool,
        states: Mutex<VecDeque<TransactionState>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(declared: bool, states: Vec<TransactionState>) -> Self {
            Self {
                declared,
                states: Mutex::new(states.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StarknetBackend for ScriptedBackend {
        fn address(&self) -> Felt {
            Felt::from(0xacc0_u64)
        }

        async fn is_declared(&self, _class_hash: Felt) -> Result<bool, NetworkError> {
            self.record("is_declared");
            Ok(self.declared)
        }

        async fn declare(&self, class: &PreparedClass) -> Result<DeclareOutcome, NetworkError> {
            self.record("declare");
            Ok(DeclareOutcome {
                transaction_hash: Some(Felt::from(DECLARE_TX)),
                class_hash: class.class_hash,
            })
        }

        async fn deploy(
            &self,
            class_hash: Felt,
            _constructor_calldata: Vec<Felt>,
            _salt: Felt,
        ) -> Result<DeployOutcome, NetworkError> {
            self.record("deploy");
            Ok(DeployOutcome {
                transaction_hash: Felt::from(DEPLOY_TX),
                contract_address: class_hash + Felt::ONE,
            })
        }

        async fn transaction_state(
            &self,
            transaction_hash: Felt,
        ) -> Result<TransactionState, NetworkError> {
            self.record(format!("state {transaction_hash:#x}"));
            Ok(self
                .states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(TransactionState::Succeeded))
        }
    }

    fn prepared_class() -> PreparedClass {
        PreparedClass {
            class: Arc::new(FlattenedSierraClass {
                sierra_program: vec![],
                contract_class_version: "0.1.0".to_string(),
                entry_points_by_type: EntryPointsByType {
                    constructor: vec![],
                    external: vec![],
                    l1_handler: vec![],
                },
                abi: "[]".to_string(),
            }),
            class_hash: Felt::from(CLASS_HASH),
            compiled_class_hash: Felt::from(0x5678_u64),
        }
    }

    fn account(backend: ScriptedBackend) -> StarknetAccount<ScriptedBackend> {
        StarknetAccount::with_backend(backend).with_poll_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn declared_class_is_deployed_without_declaring() {
        let account = account(ScriptedBackend::new(true, vec![]));

        let response = account
            .deploy_prepared(&prepared_class(), &[Felt::ONE])
            .await
            .unwrap();

        assert_eq!(response.declare.transaction_hash, None);
        assert_eq!(response.declare.class_hash, Felt::from(CLASS_HASH));
        assert_eq!(response.deploy.contract_address, Felt::from(CLASS_HASH + 1));
        assert_eq!(
            account.backend().calls(),
            vec!["is_declared", "deploy", "state 0xe0"]
        );
    }

    #[tokio::test]
    async fn new_class_is_declared_and_confirmed_before_deploy() {
        let account = account(ScriptedBackend::new(
            false,
            vec![TransactionState::Pending, TransactionState::Succeeded],
        ));

        let response = account
            .deploy_prepared(&prepared_class(), &[])
            .await
            .unwrap();

        assert_eq!(response.declare.transaction_hash, Some(Felt::from(DECLARE_TX)));
        assert_eq!(
            account.backend().calls(),
            vec![
                "is_declared",
                "declare",
                "state 0xd0",
                "state 0xd0",
                "deploy",
                "state 0xe0"
            ]
        );
    }

    #[tokio::test]
    async fn reverted_deploy_is_a_network_error() {
        let account = account(ScriptedBackend::new(
            true,
            vec![
                TransactionState::Pending,
                TransactionState::Reverted("out of gas".to_string()),
            ],
        ));

        let err = account
            .deploy_prepared(&prepared_class(), &[])
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            NetworkError::Reverted { hash, reason }
                if *hash == Felt::from(DEPLOY_TX) && reason == "out of gas"
        ));
        assert_eq!(DeployError::from(err).kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn rejected_declare_stops_before_deploy() {
        let account = account(ScriptedBackend::new(
            false,
            vec![TransactionState::Rejected("invalid signature".to_string())],
        ));

        let err = account
            .deploy_prepared(&prepared_class(), &[])
            .await
            .unwrap_err();

        assert!(matches!(&err, NetworkError::Rejected(reason) if reason == "invalid signature"));
        assert!(!account.backend().calls().contains(&"deploy".to_string()));
    }

    #[tokio::test]
    async fn rerun_against_declared_class_deploys_again() {
        let account = account(ScriptedBackend::new(true, vec![]));

        account.deploy_prepared(&prepared_class(), &[]).await.unwrap();
        account.deploy_prepared(&prepared_class(), &[]).await.unwrap();

        let calls = account.backend().calls();
        assert_eq!(calls.iter().filter(|call| *call == "deploy").count(), 2);
        assert!(!calls.contains(&"declare".to_string()));
    }

    #[test]
    fn unparseable_class_is_an_artifact_error() {
        let artifacts = ContractArtifacts {
            paths: crate::artifacts::ArtifactPaths::default(),
            sierra: serde_json::json!({"abi": []}),
            casm: serde_json::json!({}),
            abi: Default::default(),
        };

        let err = PreparedClass::from_artifacts(&artifacts).unwrap_err();
        assert!(matches!(err, ArtifactError::Schema { .. }));
    }
}
