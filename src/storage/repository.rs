use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Expense, User};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting users and their expense ledgers.
///
/// Expenses are stored with their ledger position so a reloaded ledger keeps
/// insertion order. The category index is never stored; it is rebuilt from the
/// expenses on load.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check user")?;

        Ok(row.get::<i64, _>("count") > 0)
    }

    /// Insert a new user row. Returns false, leaving the stored user untouched,
    /// if the name is already taken.
    pub async fn create_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password)
            VALUES (?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(user.username())
        .bind(user.password())
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert or replace a user together with its whole ledger, in one transaction.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO users (username, password)
            VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET password = excluded.password
            "#,
        )
        .bind(user.username())
        .bind(user.password())
        .execute(&mut *tx)
        .await
        .context("Failed to save user")?;

        sqlx::query("DELETE FROM expenses WHERE username = ?")
            .bind(user.username())
            .execute(&mut *tx)
            .await
            .context("Failed to clear expenses")?;

        for (position, expense) in user.ledger().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO expenses (username, position, date, category, price, description)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.username())
            .bind(position as i64)
            .bind(expense.date_string())
            .bind(expense.category())
            .bind(expense.price())
            .bind(expense.description())
            .execute(&mut *tx)
            .await
            .context("Failed to save expense")?;
        }

        tx.commit().await.context("Failed to commit user")?;

        debug!(
            username = user.username(),
            expenses = user.ledger().expense_count(),
            "saved user"
        );
        Ok(())
    }

    /// Load a user and rebuild its ledger from the stored expenses.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT username, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expense_rows = sqlx::query(
            r#"
            SELECT date, category, price, description
            FROM expenses
            WHERE username = ?
            ORDER BY position
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch expenses")?;

        let expenses = expense_rows
            .iter()
            .map(Self::row_to_expense)
            .collect::<Result<Vec<_>>>()?;

        let user = User::with_expenses(
            row.get::<String, _>("username"),
            row.get::<String, _>("password"),
            expenses,
        )
        .context("Invalid stored user")?;

        Ok(Some(user))
    }

    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let row = sqlx::query("SELECT password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch credentials")?;

        Ok(row.is_some_and(|row| row.get::<String, _>("password") == password))
    }

    pub async fn list_usernames(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT username FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        Ok(rows.iter().map(|row| row.get("username")).collect())
    }

    /// Delete a user and its expenses. Returns false if there was no such user.
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query("DELETE FROM expenses WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await
            .context("Failed to delete expenses")?;

        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user")?;

        tx.commit().await.context("Failed to commit deletion")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let date: String = row.get("date");

        Expense::parse(
            &date,
            row.get::<String, _>("category"),
            row.get::<f64, _>("price"),
            row.get::<String, _>("description"),
        )
        .with_context(|| format!("Invalid stored expense dated '{}'", date))
    }
}
