//! Budget operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Budget;

impl Database {
    /// The user's budget, or a zero budget if none was ever set
    pub fn get_budget(&self, user_id: &str) -> Result<Budget> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                "SELECT user_id, amount, month, updated_at FROM budgets WHERE user_id = ?",
                params![user_id],
                |row| {
                    let updated_at: Option<String> = row.get(3)?;
                    Ok(Budget {
                        user_id: row.get(0)?,
                        amount: row.get(1)?,
                        month: row.get(2)?,
                        updated_at: updated_at.as_deref().map(parse_datetime),
                    })
                },
            )
            .optional()?;

        Ok(budget.unwrap_or_else(|| Budget::empty(user_id)))
    }

    /// Create or replace the user's budget
    pub fn set_budget(&self, user_id: &str, amount: f64, month: &str) -> Result<Budget> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidInput(format!(
                "budget must be a non-negative number, got {}",
                amount
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, amount, month, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id) DO UPDATE SET
                amount = excluded.amount,
                month = excluded.month,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![user_id, amount, month.trim()],
        )?;
        drop(conn);

        self.get_budget(user_id)
    }
}
