use std::sync::Arc;

use anyhow::Context;
use chat_relay::{
    broker::Broker,
    config::{Cli, ServerConfig},
    listener, logging,
};
use clap::Parser;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    if let Err(err) = run(cli).await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::from_cli(&cli).context("invalid configuration")?;
    let server = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("could not bind to {}", config.bind_addr()))?;
    let broker = Arc::new(Broker::new(config.rooms.as_slice()));

    tracing::info!(addr = %config.bind_addr(), rooms = ?config.rooms, "listening");

    listener::run(server, broker, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // without a signal handler the server runs until it is killed
        tracing::warn!(%err, "could not listen for the interrupt signal");
        std::future::pending::<()>().await;
    }
}
