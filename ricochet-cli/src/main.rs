mod args;
mod client;
mod display;
mod server;
mod signaling;
mod tasks;
mod workers;

use anyhow::Result;
use args::{Cli, Command};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Command::Server(args) => server::run(args, cancel).await,
        Command::Client(args) => client::run(args, cancel).await,
    }
}
