use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::api;
use crate::application::ExpenseService;

/// Splitledger - shared-expense ledger service
#[derive(Parser)]
#[command(name = "splitledger")]
#[command(about = "A shared-expense ledger service with group balances and settlements")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "splitledger.db")]
    pub database: String,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub listen: String,
}

impl Cli {
    /// Initialize the database and serve the API until shutdown.
    pub async fn run(self) -> Result<()> {
        let service = ExpenseService::init(&self.database)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot initialize database: {}", e))?;
        info!("Database ready at {}", self.database);

        let app = api::router(Arc::new(service));
        let listener = tokio::net::TcpListener::bind(&self.listen)
            .await
            .with_context(|| format!("Failed to bind {}", self.listen))?;
        info!("Listening on {}", self.listen);

        axum::serve(listener, app)
            .await
            .context("Server terminated unexpectedly")?;
        Ok(())
    }
}
