//! Status command implementation

use std::path::Path;

use anyhow::Result;
use budgetwise_core::{db::DB_KEY_ENV, EngineConfig, ForecastEngine};

use super::open_db;

pub fn cmd_status(db_path: &Path, engine_config: EngineConfig, no_encrypt: bool) -> Result<()> {
    println!();
    println!("📊 Budgetwise Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        if let Err(e) = open_db(db_path, no_encrypt) {
            println!();
            println!("   ❌ Error opening database: {}", e);
            if !no_encrypt && !has_key {
                println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
            } else if has_key {
                println!("      (Check if {} is correct)", DB_KEY_ENV);
            }
        }
    }

    // Reload only; status never trains
    let engine = ForecastEngine::new(engine_config);
    let loaded = match engine.reload() {
        Ok(loaded) => loaded,
        Err(e) => {
            println!("   ❌ Model artifact unreadable: {}", e);
            false
        }
    };
    let status = engine.status();

    println!();
    println!("   Dataset: {}", status.dataset_path.display());
    if !status.dataset_path.exists() {
        println!("      (not found)");
    }
    println!("   Model: {}", status.model_path.display());
    if loaded {
        println!("   🧠 Forecast model: ready");
    } else if status.artifact_present {
        println!("   ⚠️  Forecast model: artifact present but unusable");
    } else {
        println!("   ⚠️  Forecast model: not trained (run 'budgetwise train')");
    }

    println!();
    Ok(())
}
