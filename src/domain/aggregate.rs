use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Expense, Price};

/// Sum of all prices. An empty list totals zero.
pub fn total_of(expenses: &[Expense]) -> Price {
    expenses.iter().fold(0.0, |total, e| total + e.price())
}

/// Per-category totals, most expensive category first (ties by name).
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, CategoryTotal> = HashMap::new();

    for expense in expenses {
        let entry = by_category
            .entry(expense.category())
            .or_insert_with(|| CategoryTotal {
                category: expense.category().to_string(),
                total: 0.0,
                count: 0,
            });
        entry.total += expense.price();
        entry.count += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category.into_values().collect();
    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Price,
    pub count: usize,
}

/// Aggregation strategy used by the expense service.
pub trait ExpenseCalculator {
    fn total(&self, expenses: &[Expense]) -> Price;
}

/// Plain floating-point summation of prices.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceTotal;

impl ExpenseCalculator for PriceTotal {
    fn total(&self, expenses: &[Expense]) -> Price {
        total_of(expenses)
    }
}
