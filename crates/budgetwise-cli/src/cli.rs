//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Budgetwise - Forecast your spending and spot unusual expenses
#[derive(Parser)]
#[command(name = "budgetwise")]
#[command(about = "Self-hosted expense tracker with spending forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "budgetwise.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set BUDGETWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Historical dataset CSV (overrides BUDGETWISE_DATASET)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Forecast model artifact (overrides BUDGETWISE_MODEL)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Train the forecast model from the historical dataset and save it
    Train,

    /// Predict next month's total expense
    Predict {
        /// Monthly budget
        #[arg(short, long)]
        budget: f64,

        /// Current month number (1-12, defaults to this month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Show category insights and unusual expenses for a CSV file
    Analyze {
        /// Expense CSV file (title, amount, category columns)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import expenses from CSV into a user's records
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// User the expenses belong to
        #[arg(short, long, default_value = "local-dev")]
        user: String,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (local development only)
        #[arg(long)]
        no_auth: bool,

        /// Allowed CORS origins (repeatable)
        #[arg(long = "origin")]
        origins: Vec<String>,
    },

    /// Show database and forecast model status
    Status,
}
