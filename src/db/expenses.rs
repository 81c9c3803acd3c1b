use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::debug;

use super::connection::ExpenseStore;
use crate::models::{CategoryFilter, Expense, ExpenseFilter, NewExpense};

impl ExpenseStore {
    /// Append one expense and return the id SQLite assigned to it.
    pub fn insert(&self, expense: &NewExpense) -> Result<i64> {
        let conn = self.connect()?;
        insert_expense(&conn, expense)
    }

    /// Remove the expense with `id`. Returns whether a row was actually deleted;
    /// a missing id is not an error.
    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        delete_expense(&conn, id)
    }

    /// Fetch every expense matching `filter`, in insertion order.
    pub fn query(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let conn = self.connect()?;
        query_expenses(&conn, filter)
    }

    /// Number of stored expenses, ignoring any filter.
    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        count_expenses(&conn)
    }
}

pub(crate) fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (amount, category, date, time) VALUES (?1, ?2, ?3, ?4)",
        params![expense.amount, expense.category, expense.date, expense.time],
    )
    .context("failed to insert expense")?;

    let id = conn.last_insert_rowid();
    debug!(id, category = %expense.category, "inserted expense");
    Ok(id)
}

pub(crate) fn delete_expense(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM expenses WHERE id = ?1", params![id])
        .context("failed to delete expense")?;

    debug!(id, deleted, "delete expense");
    Ok(deleted > 0)
}

/// Both constraints are optional and bound as parameters. The time prefix is
/// compared with `substr` rather than `LIKE` so `%` and `_` stay literal and
/// the match is case-sensitive. NULL columns (SQLite stores a NaN amount as
/// NULL) read back as `0` or an empty string.
pub(crate) fn query_expenses(conn: &Connection, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
    let category: Option<&str> = match &filter.category {
        CategoryFilter::All => None,
        CategoryFilter::Only(category) => Some(category),
    };
    let time_prefix: Option<&str> = if filter.time_prefix.is_empty() {
        None
    } else {
        Some(&filter.time_prefix)
    };

    let mut stmt = conn
        .prepare(
            "SELECT id,
                    COALESCE(amount, 0.0),
                    COALESCE(category, ''),
                    COALESCE(date, ''),
                    COALESCE(time, '')
             FROM expenses
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR substr(time, 1, length(?2)) = ?2)
             ORDER BY id",
        )
        .context("failed to prepare expense query")?;

    let expenses = stmt
        .query_map(params![category, time_prefix], |row| {
            Ok(Expense {
                id: row.get(0)?,
                amount: row.get(1)?,
                category: row.get(2)?,
                date: row.get(3)?,
                time: row.get(4)?,
            })
        })
        .context("failed to load expenses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect expenses")?;

    Ok(expenses)
}

pub(crate) fn count_expenses(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
        .context("failed to count expenses")?;
    Ok(count as usize)
}
