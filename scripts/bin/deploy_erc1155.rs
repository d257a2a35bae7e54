//! Declares and deploys the MyERC1155 contract to Starknet Sepolia.

use helpers::{deploy_erc1155, DeployConfig, StarknetAccount};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DeployConfig::from_env()?;
    let account = StarknetAccount::new(&config);

    // Network failures are logged inside and do not change the exit status.
    if let Some(deployment) = deploy_erc1155(&account, &config.artifacts).await? {
        info!(
            "ERC1155 contract ready at {:#x}",
            deployment.contract.address()
        );
    }

    Ok(())
}
