use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Expense, parse_price};

use super::AppError;

/// An untyped "new expense" payload, as submitted by a form or request body.
///
/// The category comes from exactly one of two inputs: a freshly typed
/// `new_category`, or an `existing_category` picked from the user's list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub new_category: Option<String>,
    #[serde(default)]
    pub existing_category: Option<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
}

impl NewExpense {
    /// Build from a string-keyed map (`date`, `newCategory`, `existingCategory`,
    /// `price`, `description`). Missing keys become empty values.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            date: get("date"),
            new_category: fields.get("newCategory").cloned(),
            existing_category: fields.get("existingCategory").cloned(),
            price: get("price"),
            description: get("description"),
        }
    }

    /// Choose the category source, then validate every field through `Expense`.
    pub fn into_expense(self) -> Result<Expense, AppError> {
        let category = resolve_category(
            self.new_category.as_deref(),
            self.existing_category.as_deref(),
        )?;
        let price = parse_price(&self.price)?;
        Ok(Expense::parse(&self.date, category, price, self.description)?)
    }
}

fn resolve_category(typed: Option<&str>, picked: Option<&str>) -> Result<String, AppError> {
    let typed = typed.filter(|s| !s.is_empty());
    let picked = picked.filter(|s| !s.is_empty());

    match (typed, picked) {
        (None, None) => Err(AppError::MissingCategory),
        (Some(category), None) | (None, Some(category)) => Ok(category.to_string()),
        (Some(_), Some(_)) => Err(AppError::ConflictingCategory),
    }
}
