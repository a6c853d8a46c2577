use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use tracing::{info, warn};

use crate::application::AccountService;
use crate::domain::{Expense, ExpenseError, ExpenseRecord};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    /// CSV line number, or 1-based record index for JSON
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

/// JSON input is either an exported snapshot or a bare list of expenses.
/// Records stay untyped here so one malformed entry is reported on its own.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Records(Vec<Value>),
    Snapshot { expenses: Vec<Value> },
}

/// Importer for loading expenses into a user's ledger
pub struct Importer<'a> {
    service: &'a AccountService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a AccountService) -> Self {
        Self { service }
    }

    /// Import expenses from CSV with a `date,category,price,description` header.
    pub async fn import_expenses_csv<R: Read>(
        &self,
        username: &str,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut batch = self.start_batch(username).await?;
        let mut csv_reader = csv::Reader::from_reader(reader);

        for (index, result) in csv_reader.deserialize::<ExpenseRecord>().enumerate() {
            let line = index + 2; // +2 for header and 0-indexing

            match result {
                Ok(record) => batch.push(line, record, &options),
                Err(e) => batch.fail(line, None, format!("CSV parse error: {}", e)),
            }
        }

        self.finish(username, batch, &options).await
    }

    /// Import expenses from a JSON snapshot or array.
    pub async fn import_expenses_json<R: Read>(
        &self,
        username: &str,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let input: JsonInput =
            serde_json::from_reader(reader).context("Failed to parse JSON input")?;
        let records = match input {
            JsonInput::Records(records) => records,
            JsonInput::Snapshot { expenses } => expenses,
        };

        let mut batch = self.start_batch(username).await?;
        for (index, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<ExpenseRecord>(value) {
                Ok(record) => batch.push(index + 1, record, &options),
                Err(e) => batch.fail(index + 1, None, format!("JSON parse error: {}", e)),
            }
        }

        self.finish(username, batch, &options).await
    }

    async fn start_batch(&self, username: &str) -> Result<Batch> {
        let existing = self.service.list_expenses(username).await?;
        Ok(Batch {
            seen: existing.into_iter().collect(),
            accepted: Vec::new(),
            result: ImportResult::default(),
        })
    }

    async fn finish(
        &self,
        username: &str,
        batch: Batch,
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let Batch {
            accepted,
            mut result,
            ..
        } = batch;

        result.imported = accepted.len();
        if !options.dry_run && !accepted.is_empty() {
            self.service.add_expenses(username, accepted).await?;
        }

        info!(
            username,
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "import finished"
        );
        Ok(result)
    }
}

struct Batch {
    seen: HashSet<Expense>,
    accepted: Vec<Expense>,
    result: ImportResult,
}

impl Batch {
    fn push(&mut self, line: usize, record: ExpenseRecord, options: &ImportOptions) {
        let expense = match Expense::try_from(record) {
            Ok(expense) => expense,
            Err(e) => {
                self.fail(line, Some(field_of(&e)), e.to_string());
                return;
            }
        };

        if options.skip_duplicates && self.seen.contains(&expense) {
            self.result.skipped += 1;
            return;
        }

        self.seen.insert(expense.clone());
        self.accepted.push(expense);
    }

    fn fail(&mut self, line: usize, field: Option<&str>, error: String) {
        warn!(line, error = %error, "skipping invalid import record");
        self.result.errors.push(ImportError {
            line,
            field: field.map(str::to_string),
            error,
        });
    }
}

fn field_of(error: &ExpenseError) -> &'static str {
    match error {
        ExpenseError::InvalidDate(_) => "date",
        ExpenseError::InvalidPrice(_) => "price",
        ExpenseError::InvalidCategory(_) => "category",
        ExpenseError::InvalidDescription => "description",
    }
}
