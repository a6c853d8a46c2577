use serde::{Deserialize, Serialize};

use crate::domain::{Expense, Price};

/// A filtered expense list together with its total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub expenses: Vec<Expense>,
    pub total: Price,
}

impl ExpenseReport {
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}
