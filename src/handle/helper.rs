use std::{fs, path::PathBuf, time::Duration};

use alloy_primitives::{keccak256, B256};
use tokio::time::sleep;

use crate::{
    object::{DeploymentRecord, Network, TransactionReceipt},
    rpc::{RpcClient, RPC},
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub fn generate_contract_deployment_path(
    network: &Network,
    contract_name: &str,
    deployment_path: &str,
) -> PathBuf {
    PathBuf::new()
        .join(deployment_path)
        .join(network.dir_name())
        .join(format!("{contract_name}.json"))
}

pub fn load_contract_deployments(path: &PathBuf) -> eyre::Result<Vec<DeploymentRecord>> {
    if path.exists() {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    } else {
        Ok(Vec::new())
    }
}

/// Read the contract's init code artifact, a hex text file produced by the
/// contract build, and hash it for the deployment record
pub fn load_contract_binary(
    contract_name: &str,
    binary_path: &str,
) -> eyre::Result<(Vec<u8>, B256)> {
    let contract_path = PathBuf::new()
        .join(binary_path)
        .join(format!("{contract_name}.bin"));
    let artifact = fs::read_to_string(&contract_path)
        .map_err(|e| eyre::eyre!("{e}:{}", contract_path.to_string_lossy()))?;
    let init_code = hex::decode(artifact.trim().trim_start_matches("0x"))
        .map_err(|e| eyre::eyre!("malformed init code artifact: {e}"))?;
    let code_hash = keccak256(&init_code);
    Ok((init_code, code_hash))
}

pub fn create_rpc_from_network(network: &Network) -> RpcClient {
    match network {
        Network::Mainnet => RpcClient::new_mainnet(),
        Network::Testnet => RpcClient::new_testnet(),
        Network::Custom(url) => RpcClient::new(url.as_str()),
    }
}

pub fn save_contract_deployment(path: PathBuf, record: DeploymentRecord) -> eyre::Result<()> {
    let mut records = load_contract_deployments(&path)?;
    if !path.exists() {
        fs::create_dir_all(path.parent().ok_or(eyre::eyre!("bad deployment path"))?)?;
    }
    records.push(record);
    let new_content = serde_json::to_string_pretty(&records)?;
    fs::write(path, new_content)?;
    Ok(())
}

/// Poll the node until the transaction is mined and the requested confirmation
/// depth is reached. Timeout policy stays with the node and the operator, not
/// here.
pub async fn wait_for_confirmation<T: RPC>(
    rpc: &T,
    tx_hash: B256,
    confirmations: u64,
) -> eyre::Result<TransactionReceipt> {
    let receipt = loop {
        if let Some(receipt) = rpc.get_transaction_receipt(tx_hash).await? {
            break receipt;
        }
        sleep(RECEIPT_POLL_INTERVAL).await;
    };
    if receipt.reverted() {
        return Err(eyre::eyre!(
            "transaction {} reverted on-chain",
            receipt.transaction_hash
        ));
    }
    if confirmations > 1 {
        let target = receipt.block_number.to::<u64>() + confirmations - 1;
        while rpc.block_number().await?.to::<u64>() < target {
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use alloy_primitives::{Address, U64};
    use futures::{future::ready, FutureExt};

    use super::*;
    use crate::{
        object::TransactionRequest,
        rpc::{Rpc, RPC},
    };

    /// Node whose receipt shows up after two polls and whose head advances
    /// one block per query, starting at the inclusion block
    #[derive(Clone, Default)]
    struct LaggingRpcClient {
        receipt_polls: Arc<AtomicU64>,
        head_polls: Arc<AtomicU64>,
    }

    const INCLUSION_BLOCK: u64 = 42;

    impl RPC for LaggingRpcClient {
        fn chain_id(&self) -> Rpc<U64> {
            ready(Ok(U64::from(31337u64))).boxed()
        }

        fn block_number(&self) -> Rpc<U64> {
            let n = self.head_polls.fetch_add(1, Ordering::SeqCst);
            ready(Ok(U64::from(INCLUSION_BLOCK + n))).boxed()
        }

        fn send_transaction(&self, tx: TransactionRequest) -> Rpc<B256> {
            ready(Ok(keccak256(serde_json::to_vec(&tx).unwrap()))).boxed()
        }

        fn get_transaction_receipt(&self, tx_hash: B256) -> Rpc<Option<TransactionReceipt>> {
            let n = self.receipt_polls.fetch_add(1, Ordering::SeqCst);
            let receipt = (n >= 2).then(|| TransactionReceipt {
                transaction_hash: tx_hash,
                block_number: U64::from(INCLUSION_BLOCK),
                contract_address: Some(Address::repeat_byte(0x34)),
                status: Some(U64::from(1u64)),
            });
            ready(Ok(receipt)).boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_polls_until_mined_and_deep_enough() {
        let rpc = LaggingRpcClient::default();
        let receipt = wait_for_confirmation(&rpc, B256::repeat_byte(0x11), 3)
            .await
            .unwrap();

        assert_eq!(receipt.block_number, U64::from(INCLUSION_BLOCK));
        // two empty polls, then the receipt
        assert_eq!(rpc.receipt_polls.load(Ordering::SeqCst), 3);
        // depth 3 from block 42 means the head must reach block 44
        assert_eq!(rpc.head_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn single_confirmation_needs_no_head_polling() {
        let rpc = LaggingRpcClient::default();
        wait_for_confirmation(&rpc, B256::repeat_byte(0x11), 1)
            .await
            .unwrap();

        assert_eq!(rpc.receipt_polls.load(Ordering::SeqCst), 3);
        assert_eq!(rpc.head_polls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn contract_binary_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("market.bin"), "0x6001600055\n").unwrap();

        let (init_code, code_hash) =
            load_contract_binary("market", build.to_str().unwrap()).unwrap();
        assert_eq!(init_code, vec![0x60, 0x01, 0x60, 0x00, 0x55]);
        assert_eq!(code_hash, keccak256(&init_code));

        fs::write(build.join("broken.bin"), "not hex at all").unwrap();
        let err = load_contract_binary("broken", build.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("malformed init code"));

        let err = load_contract_binary("missing", build.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn deployment_records_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_contract_deployment_path(
            &Network::Testnet,
            "market",
            dir.path().to_str().unwrap(),
        );
        assert!(path.ends_with("testnet/market.json"));
        assert!(load_contract_deployments(&path).unwrap().is_empty());

        let record = DeploymentRecord {
            name: "market".to_string(),
            date: "2024-01-01T00:00:00+00:00".to_string(),
            chain_id: 11155111,
            tx_hash: B256::repeat_byte(0x11),
            contract_address: alloy_primitives::Address::repeat_byte(0x22),
            code_hash: B256::repeat_byte(0x33),
            payer_address: alloy_primitives::Address::repeat_byte(0x44),
            owner_address: alloy_primitives::Address::repeat_byte(0x55),
            comment: None,
        };
        save_contract_deployment(path.clone(), record.clone()).unwrap();
        save_contract_deployment(
            path.clone(),
            DeploymentRecord {
                date: "2024-01-02T00:00:00+00:00".to_string(),
                ..record
            },
        )
        .unwrap();

        let records = load_contract_deployments(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chain_id, 11155111);
        assert_eq!(records[1].date, "2024-01-02T00:00:00+00:00");
    }
}
