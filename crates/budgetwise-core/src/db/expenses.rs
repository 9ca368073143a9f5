//! Expense operations
//!
//! Every query is scoped to a user id; one user can never read or delete
//! another user's expenses.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseRecord, NewExpense};

const EXPENSE_COLUMNS: &str = "id, user_id, title, amount, category, date, created_at";

fn validate(expense: &NewExpense) -> Result<()> {
    if expense.title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    if expense.category.trim().is_empty() {
        return Err(Error::InvalidInput("category must not be empty".to_string()));
    }
    if !expense.amount.is_finite() {
        return Err(Error::InvalidInput(format!(
            "amount must be a finite number, got {}",
            expense.amount
        )));
    }
    Ok(())
}

impl Database {
    fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
        let date: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;

        Ok(Expense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            date: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            created_at: parse_datetime(&created_at),
        })
    }

    /// Insert one expense and return its id
    pub fn add_expense(&self, user_id: &str, expense: &NewExpense) -> Result<i64> {
        validate(expense)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO expenses (user_id, title, amount, category, date) VALUES (?, ?, ?, ?, ?)",
            params![
                user_id,
                expense.title.trim(),
                expense.amount,
                expense.category.trim(),
                expense.date.map(|d| d.to_string()),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Insert a batch of expenses in one transaction
    ///
    /// Either every expense is stored or none is.
    pub fn add_expenses(&self, user_id: &str, expenses: &[NewExpense]) -> Result<Vec<i64>> {
        for expense in expenses {
            validate(expense)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(expenses.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expenses (user_id, title, amount, category, date) VALUES (?, ?, ?, ?, ?)",
            )?;
            for expense in expenses {
                stmt.execute(params![
                    user_id,
                    expense.title.trim(),
                    expense.amount,
                    expense.category.trim(),
                    expense.date.map(|d| d.to_string()),
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        Ok(ids)
    }

    /// All of a user's expenses, newest date first (undated last)
    pub fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE user_id = ?
             ORDER BY date IS NULL, date DESC, id DESC",
            EXPENSE_COLUMNS
        ))?;

        let expenses = stmt
            .query_map(params![user_id], Self::row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    pub fn get_expense(&self, user_id: &str, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, user_id],
                Self::row_to_expense,
            )
            .optional()?;

        Ok(expense)
    }

    /// Delete an expense; returns false when the user has no such expense
    pub fn delete_expense(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn count_expenses(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A user's expenses as analyzer input, in insertion order
    pub fn expense_records(&self, user_id: &str) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT title, amount, category FROM expenses WHERE user_id = ? ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![user_id], |row| {
                Ok(ExpenseRecord {
                    title: row.get(0)?,
                    amount: row.get(1)?,
                    category: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
