use std::cmp::Ordering;

use chrono::NaiveDate;

use super::{Expense, LedgerError};

/// Fail if both bounds are present and `start` is after `end`.
pub fn validate_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), LedgerError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(LedgerError::InvalidRange { start, end }),
        _ => Ok(()),
    }
}

/// Keep expenses dated within `[start, end]`. A missing bound is unbounded on that side.
pub fn filter_by_date_range(
    expenses: &[Expense],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Expense>, LedgerError> {
    validate_range(start, end)?;

    Ok(expenses
        .iter()
        .filter(|e| start.is_none_or(|start| e.date() >= start))
        .filter(|e| end.is_none_or(|end| e.date() <= end))
        .cloned()
        .collect())
}

/// Keep expenses whose category matches exactly. A missing or blank category keeps everything.
pub fn filter_by_category(expenses: &[Expense], category: Option<&str>) -> Vec<Expense> {
    match category {
        Some(category) if !category.trim().is_empty() => expenses
            .iter()
            .filter(|e| e.category() == category)
            .cloned()
            .collect(),
        _ => expenses.to_vec(),
    }
}

/// Date range first, then category. The range is validated before anything is filtered.
pub fn filter_expenses(
    expenses: &[Expense],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    category: Option<&str>,
) -> Result<Vec<Expense>, LedgerError> {
    let by_date = filter_by_date_range(expenses, start, end)?;
    Ok(filter_by_category(&by_date, category))
}

/// A stably sorted copy of `expenses`.
pub fn sort_expenses<F>(expenses: &[Expense], compare: F) -> Vec<Expense>
where
    F: FnMut(&Expense, &Expense) -> Ordering,
{
    let mut sorted = expenses.to_vec();
    sorted.sort_by(compare);
    sorted
}

/// Most expensive first.
pub fn by_price_descending(a: &Expense, b: &Expense) -> Ordering {
    b.price().total_cmp(&a.price())
}

/// Fields an expense list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    Date,
    Category,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Price => "price",
            SortKey::Date => "date",
            SortKey::Category => "category",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "price" => Some(SortKey::Price),
            "date" => Some(SortKey::Date),
            "category" => Some(SortKey::Category),
            _ => None,
        }
    }

    /// Ascending comparison on this key.
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        match self {
            SortKey::Price => a.price().total_cmp(&b.price()),
            SortKey::Date => a.date().cmp(&b.date()),
            SortKey::Category => a.category().cmp(b.category()),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filtering and sorting strategy used by the expense service.
pub trait ExpenseFilter {
    fn filter(
        &self,
        expenses: &[Expense],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        category: Option<&str>,
    ) -> Result<Vec<Expense>, LedgerError>;

    fn sort<F>(&self, expenses: &[Expense], compare: F) -> Vec<Expense>
    where
        F: FnMut(&Expense, &Expense) -> Ordering;
}

/// Inclusive date range plus exact category match, with stable sorting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCategoryFilter;

impl ExpenseFilter for DateCategoryFilter {
    fn filter(
        &self,
        expenses: &[Expense],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        category: Option<&str>,
    ) -> Result<Vec<Expense>, LedgerError> {
        filter_expenses(expenses, start, end, category)
    }

    fn sort<F>(&self, expenses: &[Expense], compare: F) -> Vec<Expense>
    where
        F: FnMut(&Expense, &Expense) -> Ordering,
    {
        sort_expenses(expenses, compare)
    }
}
