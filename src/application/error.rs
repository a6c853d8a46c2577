use thiserror::Error;

use crate::domain::{Expense, ExpenseError, LedgerError, ParsePriceError, UserError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Expense not found: {0}")]
    ExpenseNotFound(Expense),

    #[error("Please provide a category")]
    MissingCategory,

    #[error("Choose an existing category or write a new one, not both")]
    ConflictingCategory,

    #[error(transparent)]
    InvalidPrice(#[from] ParsePriceError),

    #[error(transparent)]
    InvalidExpense(#[from] ExpenseError),

    #[error(transparent)]
    InvalidUser(#[from] UserError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
