//! Expense import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use budgetwise_core::{db::Database, import::parse_expenses_csv};

use super::open_db;

pub fn cmd_import(db_path: &Path, file: &Path, user: &str, no_encrypt: bool) -> Result<()> {
    println!("📥 Importing expenses from {}...", file.display());

    let db = open_db(db_path, no_encrypt)?;
    let imported = import_expenses(&db, file, user)?;

    println!("✅ Imported {} expenses for {}", imported, user);
    Ok(())
}

/// Parse `file` and store its expenses for `user`, returning how many were added
pub fn import_expenses(db: &Database, file: &Path, user: &str) -> Result<usize> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let report = parse_expenses_csv(reader)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!("   Found {} expenses", report.expenses.len());
    for skipped in &report.skipped {
        println!("   Skipped line {}: {}", skipped.line, skipped.reason);
    }

    let ids = db
        .add_expenses(user, &report.expenses)
        .context("Failed to store expenses")?;

    db.log_audit(
        user,
        "import",
        Some("expense"),
        None,
        Some(&format!(
            "imported={} skipped={}",
            ids.len(),
            report.skipped.len()
        )),
    )?;

    Ok(ids.len())
}
