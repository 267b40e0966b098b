use std::{fmt::Display, str::FromStr};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(PartialEq, Eq, Debug)]
pub enum Network {
    Mainnet,
    Testnet,
    Custom(Url),
}

impl Network {
    /// Directory component used when recording deployments for this network
    pub fn dir_name(&self) -> String {
        match self {
            Network::Mainnet => "mainnet".to_string(),
            Network::Testnet => "testnet".to_string(),
            Network::Custom(url) => url.host_str().unwrap_or("custom").to_string(),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Custom(url) => write!(f, "{}", url),
        }
    }
}

impl FromStr for Network {
    type Err = eyre::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Ok(Network::Custom(value.parse()?)),
        }
    }
}

/// Contract creation transaction, serialized as the single parameter of
/// `eth_sendTransaction`. The node fills nonce and gas for the `from` account
/// it holds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

impl TransactionRequest {
    /// Assemble a creation transaction carrying `init_code` plus the
    /// ABI-encoded constructor argument, with a zero attached value
    pub fn contract_creation(from: Address, owner: Address, init_code: Vec<u8>) -> Self {
        let mut data = init_code;
        data.extend_from_slice(B256::left_padding_from(owner.as_slice()).as_slice());
        TransactionRequest {
            from,
            to: None,
            value: U256::ZERO,
            data: data.into(),
        }
    }
}

/// The subset of `eth_getTransactionReceipt` this tool acts on. `status` is
/// absent on pre-Byzantium chains, in which case inclusion counts as success.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: U64,
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn reverted(&self) -> bool {
        self.status == Some(U64::ZERO)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeploymentRecord {
    pub name: String,
    pub date: String,
    pub chain_id: u64,
    pub tx_hash: B256,
    pub contract_address: Address,
    pub code_hash: B256,
    pub payer_address: Address,
    pub owner_address: Address,
    // This field is not required, so you can edit your <contract>.json file to add comment for cooperations
    #[serde(default)]
    pub comment: Option<String>,
}
