//! Budgetwise CLI - Expense tracker with spending forecasts
//!
//! Usage:
//!   budgetwise init                       Initialize database
//!   budgetwise train                      Train and save the forecast model
//!   budgetwise predict --budget 6000      Forecast next month's expense
//!   budgetwise analyze --file CSV         Insights and anomalies for a CSV
//!   budgetwise serve --port 3000          Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use budgetwise_core::EngineConfig;
use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let engine_config = EngineConfig::from_env().with_overrides(cli.dataset, cli.model);

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Train => commands::cmd_train(engine_config),
        Commands::Predict { budget, month } => commands::cmd_predict(engine_config, budget, month),
        Commands::Analyze { file } => commands::cmd_analyze(&file),
        Commands::Import { file, user } => {
            commands::cmd_import(&cli.db, &file, &user, cli.no_encrypt)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            origins,
        } => {
            commands::cmd_serve(
                &cli.db,
                engine_config,
                &host,
                port,
                no_auth,
                origins,
                cli.no_encrypt,
            )
            .await
        }
        Commands::Status => commands::cmd_status(&cli.db, engine_config, cli.no_encrypt),
    }
}
