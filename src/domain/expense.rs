use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Price, format_price};

/// Canonical date format at every boundary: `dd.MM.yyyy`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a date strictly against `dd.MM.yyyy` (two-digit day and month, four-digit year).
pub fn parse_date(input: &str) -> Result<NaiveDate, ExpenseError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[2] == b'.'
        && bytes[5] == b'.'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !well_formed {
        return Err(ExpenseError::InvalidDate(input.to_string()));
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| ExpenseError::InvalidDate(input.to_string()))
}

/// Render a date in the canonical `dd.MM.yyyy` format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpenseError {
    #[error("Invalid date '{0}': the date format should be 'dd.MM.yyyy'")]
    InvalidDate(String),

    #[error("Invalid price {0}: price must be a non-negative number")]
    InvalidPrice(Price),

    #[error("Invalid category '{0}': category must be non-empty and contain only letters")]
    InvalidCategory(String),

    #[error("Description cannot be empty")]
    InvalidDescription,
}

/// A single validated expense.
///
/// Every field is checked on construction, so an `Expense` that exists is always
/// complete and valid. Changes produce a new value through the `with_*` methods;
/// the ledger replaces old values with new ones. Equality and hashing cover all
/// four fields: there is no identity beyond the value itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    date: NaiveDate,
    category: String,
    price: Price,
    description: String,
}

impl Expense {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        price: Price,
        description: impl Into<String>,
    ) -> Result<Self, ExpenseError> {
        Ok(Self {
            date: validate_date(date)?,
            category: validate_category(category.into())?,
            price: validate_price(price)?,
            description: validate_description(description.into())?,
        })
    }

    /// Construct from a `dd.MM.yyyy` date string.
    pub fn parse(
        date: &str,
        category: impl Into<String>,
        price: Price,
        description: impl Into<String>,
    ) -> Result<Self, ExpenseError> {
        Self::new(parse_date(date)?, category, price, description)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date in canonical `dd.MM.yyyy` form.
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn with_date(mut self, date: NaiveDate) -> Result<Self, ExpenseError> {
        self.date = validate_date(date)?;
        Ok(self)
    }

    pub fn with_date_str(self, date: &str) -> Result<Self, ExpenseError> {
        self.with_date(parse_date(date)?)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Result<Self, ExpenseError> {
        self.category = validate_category(category.into())?;
        Ok(self)
    }

    pub fn with_price(mut self, price: Price) -> Result<Self, ExpenseError> {
        self.price = validate_price(price)?;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Result<Self, ExpenseError> {
        self.description = validate_description(description.into())?;
        Ok(self)
    }
}

// Four-digit years only, so every date renders back as `dd.MM.yyyy`.
fn validate_date(date: NaiveDate) -> Result<NaiveDate, ExpenseError> {
    if !(0..=9999).contains(&date.year()) {
        return Err(ExpenseError::InvalidDate(date.to_string()));
    }
    Ok(date)
}

fn validate_category(category: String) -> Result<String, ExpenseError> {
    // Letters only: "Home Improvement" and "Take-away" are rejected.
    if category.is_empty() || !category.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ExpenseError::InvalidCategory(category));
    }
    Ok(category)
}

fn validate_price(price: Price) -> Result<Price, ExpenseError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ExpenseError::InvalidPrice(price));
    }
    // -0.0 + 0.0 == +0.0, which keeps Eq and Hash in agreement
    Ok(price + 0.0)
}

fn validate_description(description: String) -> Result<String, ExpenseError> {
    if description.trim().is_empty() {
        return Err(ExpenseError::InvalidDescription);
    }
    Ok(description)
}

impl PartialEq for Expense {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
            && self.category == other.category
            && self.price == other.price
            && self.description == other.description
    }
}

// Prices are never NaN, so equality is reflexive.
impl Eq for Expense {}

impl Hash for Expense {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.date.hash(state);
        self.category.hash(state);
        self.price.to_bits().hash(state);
        self.description.hash(state);
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "| {} | {} | {} | {} |",
            self.date_string(),
            self.category,
            self.description,
            format_price(self.price)
        )
    }
}

/// The serialized shape of an expense: four fields, date as `dd.MM.yyyy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: String,
    pub category: String,
    pub price: Price,
    pub description: String,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = ExpenseError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        Expense::parse(
            &record.date,
            record.category,
            record.price,
            record.description,
        )
    }
}

impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        Self {
            date: expense.date_string(),
            category: expense.category,
            price: expense.price,
            description: expense.description,
        }
    }
}
