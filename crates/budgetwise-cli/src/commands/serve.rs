//! Server command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use budgetwise_core::{BootstrapOutcome, EngineConfig, ForecastEngine};
use budgetwise_server::{ServerConfig, API_KEYS_ENV, JWT_SECRET_ENV};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    engine_config: EngineConfig,
    host: &str,
    port: u16,
    no_auth: bool,
    origins: Vec<String>,
    no_encrypt: bool,
) -> Result<()> {
    println!("🚀 Starting Budgetwise web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins: origins,
        ..ServerConfig::default()
    }
    .with_env_credentials();

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        if config.jwt_secret.is_some() {
            println!("   🔐 Authentication: bearer JWT ({})", JWT_SECRET_ENV);
        }
        if !config.api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured ({})",
                config.api_keys.len(),
                API_KEYS_ENV
            );
        }
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }

    let db = open_db(db_path, no_encrypt)?;

    // Reloading or training the model is blocking file and CPU work
    let (engine, outcome) = tokio::task::spawn_blocking(move || {
        let engine = ForecastEngine::new(engine_config);
        let outcome = engine.initialize();
        (engine, outcome)
    })
    .await
    .context("Forecast model bootstrap panicked")?;

    match outcome {
        BootstrapOutcome::Loaded => println!("   🧠 Forecast model: loaded"),
        BootstrapOutcome::Trained(summary) => println!(
            "   🧠 Forecast model: trained from {} rows",
            summary.rows_used
        ),
        BootstrapOutcome::Untrained { reason } => {
            println!("   ⚠️  Forecast model: unavailable ({})", reason)
        }
    }

    println!();
    println!("   Press Ctrl+C to stop");

    budgetwise_server::serve_with_config(db, Arc::new(engine), host, port, config).await?;

    Ok(())
}
