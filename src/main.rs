mod command;
mod handle;
mod object;
mod rpc;

#[tokio::main]
pub async fn main() -> eyre::Result<()> {
    command::dispatch_commands().await
}
