use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::info;

use crate::application::AccountService;
use crate::domain::{Expense, ExpenseRecord, Price};

/// One user's ledger as exported to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub username: String,
    pub expenses: Vec<Expense>,
    pub categories: Vec<String>,
    pub total: Price,
}

/// Exporter for writing a user's expenses to various formats
pub struct Exporter<'a> {
    service: &'a AccountService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a AccountService) -> Self {
        Self { service }
    }

    /// Export expenses to CSV in ledger order (`date,category,price,description`).
    pub async fn export_expenses_csv<W: Write>(&self, username: &str, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(username).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut count = 0;
        for expense in expenses {
            csv_writer.serialize(ExpenseRecord::from(expense))?;
            count += 1;
        }

        csv_writer.flush()?;
        info!(username, count, "exported expenses to csv");
        Ok(count)
    }

    /// Export the whole ledger as a JSON snapshot.
    pub async fn export_expenses_json<W: Write>(
        &self,
        username: &str,
        mut writer: W,
    ) -> Result<ExpenseSnapshot> {
        let user = self.service.get_user(username).await?;
        let expense_service = self.service.expense_service();

        let mut categories: Vec<String> = expense_service
            .categories_for(&user)
            .into_iter()
            .collect();
        categories.sort();

        let snapshot = ExpenseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            username: user.username().to_string(),
            expenses: expense_service.all_for(&user),
            categories,
            total: expense_service.total_for(&user),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        info!(
            username,
            count = snapshot.expenses.len(),
            "exported expenses to json"
        );
        Ok(snapshot)
    }
}
