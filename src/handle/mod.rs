use alloy_primitives::Address;
use chrono::prelude::Utc;

use crate::{
    object::{DeploymentRecord, Network, TransactionRequest},
    rpc::RPC,
};

mod helper;
pub use helper::*;

/// The one contract this tool deploys
pub const CONTRACT_NAME: &str = "InscriptionMarket_v1";

/// Deploy the market contract and report its confirmed address
pub async fn deploy_contract<T: RPC>(
    network: &Network,
    rpc: T,
    payer_address: Address,
    owner_address: String,
    confirmations: u64,
    deployment_path: String,
    binary_path: String,
) -> eyre::Result<DeploymentRecord> {
    let owner_address: Address = owner_address.parse().map_err(|_| {
        eyre::eyre!(
            "invalid owner address {owner_address:?}, set `owner_test` or pass --owner-address"
        )
    })?;
    let (init_code, code_hash) = load_contract_binary(CONTRACT_NAME, &binary_path)?;
    let chain_id = rpc.chain_id().await?.to::<u64>();
    let request = TransactionRequest::contract_creation(payer_address, owner_address, init_code);
    let tx_hash = rpc.send_transaction(request).await?;
    println!("Transaction hash: {tx_hash}");
    let receipt = wait_for_confirmation(&rpc, tx_hash, confirmations).await?;
    let contract_address = receipt
        .contract_address
        .ok_or(eyre::eyre!("confirmed receipt carries no contract address"))?;
    let record = DeploymentRecord {
        name: CONTRACT_NAME.to_string(),
        date: Utc::now().to_rfc3339(),
        chain_id,
        tx_hash,
        contract_address,
        code_hash,
        payer_address,
        owner_address,
        comment: None,
    };
    let record_path = generate_contract_deployment_path(network, CONTRACT_NAME, &deployment_path);
    save_contract_deployment(record_path, record.clone())?;
    println!("{}", deployed_line(&record));
    Ok(record)
}

pub fn deployed_line(record: &DeploymentRecord) -> String {
    format!("market_v1 deployed to {}", record.contract_address)
}
