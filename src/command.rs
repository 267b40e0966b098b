use alloy_primitives::Address;
use clap::{Parser, Subcommand};

use crate::handle::{create_rpc_from_network, deploy_contract};
use crate::object::Network;

/// Environment variable holding the contract owner address
pub const OWNER_ENV: &str = "owner_test";

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// EVM network, options are `mainnet`, `testnet` or URL (e.g. http://localhost:8545)
    #[arg(short, long, default_value_t = String::from("testnet"))]
    network: String,

    /// Directory of the contract deployment records
    #[arg(long, default_value_t = String::from("deployment"))]
    deployment_path: String,

    /// Directory of the compiled contract init code
    #[arg(long, default_value_t = String::from("build"))]
    contract_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the InscriptionMarket_v1 contract
    Deploy {
        /// Who pays the deployment transaction, must be an account the node holds
        #[arg(long)]
        payer_address: String,
        /// Who owns the market contract, if None, the `owner_test` environment variable is read
        #[arg(long)]
        owner_address: Option<String>,
        /// How many blocks on top of the deployment count as final
        #[arg(long, default_value_t = 1)]
        confirmations: u64,
    },
}

/// Parse and dispatch commands
pub async fn dispatch_commands() -> eyre::Result<()> {
    let cli = Cli::parse();
    let network: Network = cli.network.parse()?;
    match cli.command {
        Commands::Deploy {
            payer_address,
            owner_address,
            confirmations,
        } => {
            let payer_address: Address = payer_address
                .parse()
                .map_err(|_| eyre::eyre!("invalid payer address {payer_address:?}"))?;
            let owner_address = owner_address
                .or_else(|| std::env::var(OWNER_ENV).ok())
                .unwrap_or_default();
            let rpc = create_rpc_from_network(&network);
            deploy_contract(
                &network,
                rpc,
                payer_address,
                owner_address,
                confirmations,
                cli.deployment_path,
                cli.contract_path,
            )
            .await?;
            Ok(())
        }
    }
}
