use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{CategoryTotal, Expense, User};
use crate::storage::Repository;

use super::{AppError, ExpenseReport, ExpenseService, NewExpense};

/// Application service providing user-level operations over persisted ledgers.
/// This is the primary interface for any client (CLI, import/export, ...).
///
/// Every mutating call loads the user, applies the change in memory and only
/// then writes the whole user back, so a failed operation never reaches storage.
pub struct AccountService {
    repo: Repository,
    expenses: ExpenseService,
}

impl AccountService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            expenses: ExpenseService::new(),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn expense_service(&self) -> &ExpenseService {
        &self.expenses
    }

    // ========================
    // User operations
    // ========================

    /// Create a user with an empty ledger.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = User::new(username, password)?;

        if !self.repo.create_user(&user).await? {
            return Err(AppError::UserAlreadyExists(username.to_string()));
        }

        info!(username, "created user");
        Ok(user)
    }

    /// Unknown users and wrong passwords fail alike.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        if !self.repo.verify_password(username, password).await? {
            warn!(username, "authentication failed");
            return Err(AppError::AuthenticationFailed);
        }
        self.get_user(username).await
    }

    pub async fn get_user(&self, username: &str) -> Result<User, AppError> {
        self.repo
            .get_user(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    pub async fn list_usernames(&self) -> Result<Vec<String>, AppError> {
        Ok(self.repo.list_usernames().await?)
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        if !self.repo.delete_user(username).await? {
            return Err(AppError::UserNotFound(username.to_string()));
        }
        info!(username, "deleted user");
        Ok(())
    }

    // ========================
    // Expense operations
    // ========================

    /// Validate a request payload and append the resulting expense.
    pub async fn add_expense(&self, username: &str, request: NewExpense) -> Result<User, AppError> {
        let mut user = self.get_user(username).await?;
        let expense = request.into_expense()?;

        self.expenses.add_for(&mut user, expense);
        self.repo.save_user(&user).await?;
        Ok(user)
    }

    /// Append several already-validated expenses with a single save.
    pub async fn add_expenses(
        &self,
        username: &str,
        expenses: Vec<Expense>,
    ) -> Result<usize, AppError> {
        let mut user = self.get_user(username).await?;
        let count = expenses.len();

        for expense in expenses {
            self.expenses.add_for(&mut user, expense);
        }
        self.repo.save_user(&user).await?;

        info!(username, count, "added expenses");
        Ok(count)
    }

    /// Delete the stored expense equal to `expense`.
    pub async fn delete_expense(&self, username: &str, expense: &Expense) -> Result<User, AppError> {
        let mut user = self.get_user(username).await?;

        let stored = self
            .expenses
            .find(&user, expense)
            .cloned()
            .ok_or_else(|| AppError::ExpenseNotFound(expense.clone()))?;
        self.expenses.remove_for(&mut user, &stored);

        self.repo.save_user(&user).await?;
        Ok(user)
    }

    pub async fn update_expense(
        &self,
        username: &str,
        old: &Expense,
        new: Expense,
    ) -> Result<User, AppError> {
        let mut user = self.get_user(username).await?;

        if self.expenses.find(&user, old).is_none() {
            return Err(AppError::ExpenseNotFound(old.clone()));
        }
        self.expenses.update_for(&mut user, old, new)?;

        self.repo.save_user(&user).await?;
        Ok(user)
    }

    /// All expenses in insertion order.
    pub async fn list_expenses(&self, username: &str) -> Result<Vec<Expense>, AppError> {
        let user = self.get_user(username).await?;
        Ok(self.expenses.all_for(&user))
    }

    pub async fn categories(&self, username: &str) -> Result<HashSet<String>, AppError> {
        let user = self.get_user(username).await?;
        Ok(self.expenses.categories_for(&user))
    }

    /// Filtered expenses, most expensive first.
    pub async fn filter_expenses(
        &self,
        username: &str,
        category: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, AppError> {
        let user = self.get_user(username).await?;
        Ok(self
            .expenses
            .filter_and_sort_for(&user, category, start, end)?)
    }

    /// Filtered expenses, most expensive first, with their total.
    pub async fn report(
        &self,
        username: &str,
        category: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseReport, AppError> {
        let user = self.get_user(username).await?;
        Ok(self.expenses.report_for(&user, category, start, end)?)
    }

    pub async fn category_totals(&self, username: &str) -> Result<Vec<CategoryTotal>, AppError> {
        let user = self.get_user(username).await?;
        Ok(self.expenses.category_totals_for(&user))
    }
}
