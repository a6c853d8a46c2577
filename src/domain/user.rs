use std::fmt;

use thiserror::Error;

use super::{Expense, Ledger};

pub const MAX_USERNAME_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username cannot exceed {max} characters: {0}", max = MAX_USERNAME_LEN)]
    UsernameTooLong(String),

    #[error("Username should only contain alphabetic characters: {0}")]
    UsernameNotAlphabetic(String),

    #[error("Password cannot be empty")]
    EmptyPassword,
}

/// An account holder: credentials plus exactly one ledger.
#[derive(Clone)]
pub struct User {
    username: String,
    password: String,
    ledger: Ledger,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, UserError> {
        Self::with_ledger(username, password, Ledger::new())
    }

    pub fn with_expenses(
        username: impl Into<String>,
        password: impl Into<String>,
        expenses: Vec<Expense>,
    ) -> Result<Self, UserError> {
        Self::with_ledger(username, password, Ledger::from_expenses(expenses))
    }

    pub fn with_ledger(
        username: impl Into<String>,
        password: impl Into<String>,
        ledger: Ledger,
    ) -> Result<Self, UserError> {
        Ok(Self {
            username: validate_username(username.into())?,
            password: validate_password(password.into())?,
            ledger,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The stored credential, as given at creation.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

// Keep the credential out of logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ledger", &self.ledger)
            .finish()
    }
}

fn validate_username(username: String) -> Result<String, UserError> {
    if username.is_empty() {
        return Err(UserError::EmptyUsername);
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(UserError::UsernameTooLong(username));
    }
    if !username.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(UserError::UsernameNotAlphabetic(username));
    }
    Ok(username)
}

fn validate_password(password: String) -> Result<String, UserError> {
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }
    Ok(password)
}
