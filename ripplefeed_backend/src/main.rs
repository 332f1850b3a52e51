use anyhow::Result;
use clap::{Parser, Subcommand};
use ripplefeed_backend::api;
use ripplefeed_backend::bootstrap;
use ripplefeed_backend::config::RipplefeedConfig;
use ripplefeed_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Ripplefeed backend daemon")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = RipplefeedConfig::from_env()?;
    let resources = bootstrap::initialize(&config)?;
    tracing::info!(
        database_initialized = resources.database_initialized,
        directories_created = resources.directories_created.len(),
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, resources.database).await,
    }
}
