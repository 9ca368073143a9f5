//! Forecast and analysis commands (train, predict, analyze)

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use budgetwise_core::{
    engine::{category_insights, find_anomalies, BootstrapOutcome, InsightReport},
    import::parse_expenses_csv,
    models::ExpenseRecord,
    EngineConfig, ForecastEngine,
};
use chrono::Datelike;

pub fn cmd_train(config: EngineConfig) -> Result<()> {
    println!(
        "🧠 Training forecast model from {}...",
        config.dataset_path.display()
    );

    let engine = ForecastEngine::new(config);
    let summary = engine
        .train_and_persist()
        .context("Failed to train forecast model")?;

    println!("   Rows used: {}", summary.rows_used);
    if summary.rows_skipped > 0 {
        println!("   Rows skipped: {}", summary.rows_skipped);
    }

    if summary.persisted {
        println!(
            "✅ Model saved to {}",
            engine.config().model_path.display()
        );
    } else {
        println!(
            "⚠️  Model trained but could not be saved to {}",
            engine.config().model_path.display()
        );
    }

    Ok(())
}

pub fn cmd_predict(config: EngineConfig, budget: f64, month: Option<u32>) -> Result<()> {
    let current_month = month.unwrap_or_else(|| chrono::Local::now().month());

    let engine = ForecastEngine::new(config);
    match engine.initialize() {
        BootstrapOutcome::Loaded => {}
        BootstrapOutcome::Trained(summary) => {
            println!("   Trained a new model from {} rows", summary.rows_used);
        }
        BootstrapOutcome::Untrained { reason } => {
            println!("⚠️  Forecast model unavailable: {}", reason);
        }
    }

    match engine.forecast_next_month(budget, current_month)? {
        Some(forecast) => {
            println!();
            println!("📈 Forecast for {}", forecast.next_month);
            println!("   Budget: ₹{:.2}", budget);
            println!("   Predicted expense: ₹{:.2}", forecast.value);
            if forecast.value > budget {
                println!(
                    "   ⚠️  Over budget by ₹{:.2}",
                    forecast.value - budget
                );
            }
        }
        None => {
            println!("   Predicted expense: ₹0.00 (no model)");
            println!("   Provide a dataset with --dataset or BUDGETWISE_DATASET and run 'budgetwise train'.");
        }
    }

    Ok(())
}

/// Read an expense CSV into analyzer records, reporting skipped rows
pub fn load_expense_records(file: &Path) -> Result<Vec<ExpenseRecord>> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let report = parse_expenses_csv(reader)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    for skipped in &report.skipped {
        println!("   Skipped line {}: {}", skipped.line, skipped.reason);
    }

    Ok(report
        .expenses
        .into_iter()
        .map(|e| ExpenseRecord::new(e.title, e.amount, e.category))
        .collect())
}

pub fn cmd_analyze(file: &Path) -> Result<()> {
    println!("🔍 Analyzing {}...", file.display());

    let records = load_expense_records(file)?;
    println!("   Found {} expenses", records.len());

    println!();
    println!("💡 Insights");
    println!("   ─────────────────────────────");
    match category_insights(&records) {
        InsightReport::Insights(insights) if insights.is_empty() => {
            println!("   No single category dominates your spending.");
        }
        report => {
            for message in report.messages() {
                println!("   {}", message);
            }
        }
    }

    println!();
    println!("🚨 Unusual expenses");
    println!("   ─────────────────────────────");
    let flags = find_anomalies(&records);
    if flags.is_empty() {
        println!("   None detected.");
    } else {
        for flag in &flags {
            println!("   {}", flag);
        }
    }

    Ok(())
}
