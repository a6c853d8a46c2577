// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use money_spender::application::{AccountService, NewExpense};
use money_spender::domain::{Expense, Price};
use tempfile::TempDir;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(AccountService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = AccountService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test service with `alice` already registered
pub async fn test_service_with_user() -> Result<(AccountService, TempDir)> {
    let (service, temp) = test_service().await?;
    service.create_user(USER, PASSWORD).await?;
    Ok((service, temp))
}

/// Helper to parse an ISO date string
pub fn iso_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn expense(date: &str, category: &str, price: Price, description: &str) -> Expense {
    Expense::parse(date, category, price, description).unwrap()
}

/// A request that types a new category
pub fn request(date: &str, category: &str, price: &str, description: &str) -> NewExpense {
    NewExpense {
        date: date.into(),
        new_category: Some(category.into()),
        existing_category: None,
        price: price.into(),
        description: description.into(),
    }
}

/// Test fixture: a small ledger spread over two months
pub struct StandardExpenses;

impl StandardExpenses {
    pub fn all() -> Vec<Expense> {
        vec![
            expense("05.01.2024", "Food", 75.0, "Groceries"),
            expense("12.01.2024", "Rent", 750.0, "January rent"),
            expense("20.01.2024", "Food", 150.0, "Dinner out"),
            expense("03.02.2024", "Travel", 420.5, "Train tickets"),
            expense("14.02.2024", "Food", 32.25, "Lunch"),
        ]
    }

    pub async fn load(service: &AccountService) -> Result<()> {
        service.add_expenses(USER, Self::all()).await?;
        Ok(())
    }
}
