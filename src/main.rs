use anyhow::Result;
use clap::Parser;
use splitledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitledger=info".into()),
        )
        .init();

    let cli = Cli::parse();
    cli.run().await
}
