use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{B256, U64};
use eyre::{eyre, Error};
use futures::FutureExt;
use jsonrpc_core::response::Output;
use reqwest::{Client, Url};

use crate::object::{TransactionReceipt, TransactionRequest};

pub type Rpc<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'static>>;

pub const MAINNET_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";
pub const TESTNET_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Strict servers reject `"params": null`, so an empty parameter list
/// becomes `[]` on the wire
fn request_body(id: u64, method: &str, params: serde_json::Value) -> serde_json::Value {
    let params = match params {
        serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
        other => other,
    };
    serde_json::json!({ "id": id, "jsonrpc": "2.0", "method": method, "params": params })
}

macro_rules! jsonrpc {
    ($method:expr, $self:ident, $return:ty$(, $params:ident$(,)?)*) => {{
        let req_json = request_body(
            $self.id.fetch_add(1, Ordering::Relaxed),
            $method,
            serde_json::to_value(($($params,)*)).unwrap(),
        );

        let c = $self.raw.post($self.uri.clone()).json(&req_json);
        async {
            let resp = c
                .send()
                .await
                .map_err::<Error, _>(|_| eyre!("bad node request url"))?;
            let output = resp
                .json::<Output>()
                .await
                .map_err::<Error, _>(|_| eyre!("failed to parse json response"))?;

            match output {
                Output::Success(success) => serde_json::from_value::<$return>(success.result)
                    .map_err(|e| eyre!("unexpected {} result: {e}", $method)),
                Output::Failure(failure) => {
                    Err(eyre!("node rejected {}: {}", $method, failure.error.message))
                }
            }
        }
    }}
}

/// The four node calls this tool consumes, kept as a trait so tests can
/// substitute a scripted client.
#[allow(clippy::upper_case_acronyms)]
pub trait RPC: Clone + Send + Sync {
    fn chain_id(&self) -> Rpc<U64>;
    fn block_number(&self) -> Rpc<U64>;
    fn send_transaction(&self, tx: TransactionRequest) -> Rpc<B256>;
    fn get_transaction_receipt(&self, tx_hash: B256) -> Rpc<Option<TransactionReceipt>>;
}

#[derive(Clone)]
pub struct RpcClient {
    raw: Client,
    uri: Url,
    id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(uri: &str) -> Self {
        let uri = Url::parse(uri).expect("node uri, e.g. \"http://127.0.0.1:8545\"");

        RpcClient {
            raw: Client::new(),
            uri,
            id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn new_mainnet() -> Self {
        RpcClient::new(MAINNET_RPC_URL)
    }

    pub fn new_testnet() -> Self {
        RpcClient::new(TESTNET_RPC_URL)
    }
}

impl RPC for RpcClient {
    fn chain_id(&self) -> Rpc<U64> {
        jsonrpc!("eth_chainId", self, U64).boxed()
    }

    fn block_number(&self) -> Rpc<U64> {
        jsonrpc!("eth_blockNumber", self, U64).boxed()
    }

    fn send_transaction(&self, tx: TransactionRequest) -> Rpc<B256> {
        jsonrpc!("eth_sendTransaction", self, B256, tx).boxed()
    }

    fn get_transaction_receipt(&self, tx_hash: B256) -> Rpc<Option<TransactionReceipt>> {
        jsonrpc!(
            "eth_getTransactionReceipt",
            self,
            Option<TransactionReceipt>,
            tx_hash
        )
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_are_an_array_on_the_wire() {
        let body = request_body(0, "eth_blockNumber", serde_json::to_value(()).unwrap());
        assert_eq!(body["method"], "eth_blockNumber");
        assert_eq!(body["params"], serde_json::json!([]));
    }

    #[test]
    fn hash_param_is_a_single_hex_entry() {
        let tx_hash = B256::repeat_byte(0x11);
        let body = request_body(
            1,
            "eth_getTransactionReceipt",
            serde_json::to_value((tx_hash,)).unwrap(),
        );
        assert_eq!(body["id"], 1);
        assert_eq!(
            body["params"],
            serde_json::json!([format!("0x{}", "11".repeat(32))])
        );
    }
}
