use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::Expense;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Expense not found: {0}")]
    NotFound(Expense),

    #[error("Start date cannot be after end date ({start} > {end})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// An ordered collection of one user's expenses plus the set of categories in use.
///
/// The category set is a derived index: after every public operation it equals
/// exactly the set of categories of the stored expenses. It is not reference
/// counted, so removals rescan the remaining expenses to decide whether a
/// category is still in use.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    expenses: Vec<Expense>,
    categories: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored expenses, deriving the category index from them.
    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        let mut ledger = Self {
            expenses,
            categories: HashSet::new(),
        };
        ledger.rebuild_categories();
        ledger
    }

    /// Recompute the category index from the stored expenses.
    pub fn rebuild_categories(&mut self) {
        self.categories = self
            .expenses
            .iter()
            .map(|e| e.category().to_string())
            .collect();
    }

    /// Append an expense. Duplicates are allowed.
    pub fn add(&mut self, expense: Expense) {
        debug!(
            category = expense.category(),
            price = expense.price(),
            "adding expense"
        );
        self.categories.insert(expense.category().to_string());
        self.expenses.push(expense);
    }

    /// Remove the first expense equal to `expense`.
    ///
    /// Returns the removed value, or `None` if nothing matched.
    pub fn remove(&mut self, expense: &Expense) -> Option<Expense> {
        let index = self.position(expense)?;
        let removed = self.expenses.remove(index);

        if !self.category_in_use(removed.category(), None) {
            debug!(category = removed.category(), "dropping unused category");
            self.categories.remove(removed.category());
        }

        debug!(category = removed.category(), "removed expense");
        Some(removed)
    }

    /// Replace the first expense equal to `old` with `new`, keeping its position.
    ///
    /// Returns the replaced value. Fails with [`LedgerError::NotFound`] without
    /// touching the ledger if `old` is not stored.
    pub fn update(&mut self, old: &Expense, new: Expense) -> Result<Expense, LedgerError> {
        let index = self
            .position(old)
            .ok_or_else(|| LedgerError::NotFound(old.clone()))?;

        // The new category goes in before the old one can leave, and the entry
        // being replaced must not count as a user of the old category.
        if old.category() != new.category() {
            self.categories.insert(new.category().to_string());
            if !self.category_in_use(old.category(), Some(index)) {
                debug!(category = old.category(), "dropping unused category");
                self.categories.remove(old.category());
            }
        }

        debug!(index, "updated expense");
        Ok(std::mem::replace(&mut self.expenses[index], new))
    }

    /// A copy of the expenses in insertion order.
    pub fn list(&self) -> Vec<Expense> {
        self.expenses.clone()
    }

    /// A copy of the categories currently in use.
    pub fn categories(&self) -> HashSet<String> {
        self.categories.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter()
    }

    pub fn as_slice(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    fn position(&self, expense: &Expense) -> Option<usize> {
        self.expenses.iter().position(|e| e == expense)
    }

    fn category_in_use(&self, category: &str, skip: Option<usize>) -> bool {
        self.expenses
            .iter()
            .enumerate()
            .any(|(i, e)| Some(i) != skip && e.category() == category)
    }
}

impl FromIterator<Expense> for Ledger {
    fn from_iter<I: IntoIterator<Item = Expense>>(iter: I) -> Self {
        Self::from_expenses(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(date: &str, category: &str, price: f64, description: &str) -> Expense {
        Expense::parse(date, category, price, description).unwrap()
    }

    fn categories_of(ledger: &Ledger) -> HashSet<String> {
        ledger
            .list()
            .iter()
            .map(|e| e.category().to_string())
            .collect()
    }

    fn assert_consistent(ledger: &Ledger) {
        assert_eq!(
            ledger.categories(),
            categories_of(ledger),
            "category index out of sync with expenses"
        );
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.expense_count(), 0);
        assert_eq!(ledger.category_count(), 0);
    }

    #[test]
    fn test_from_expenses_derives_categories() {
        let ledger = Ledger::from_expenses(vec![
            expense("01.01.2024", "Food", 10.0, "a"),
            expense("02.01.2024", "Travel", 20.0, "b"),
            expense("03.01.2024", "Food", 30.0, "c"),
        ]);

        assert_eq!(ledger.expense_count(), 3);
        assert_eq!(ledger.category_count(), 2);
        assert!(ledger.contains_category("Food"));
        assert!(ledger.contains_category("Travel"));
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut ledger = Ledger::new();
        let first = expense("05.01.2024", "Food", 10.0, "a");
        let second = expense("01.01.2024", "Rent", 5000.0, "b");

        ledger.add(first.clone());
        ledger.add(second.clone());

        assert_eq!(ledger.list(), vec![first, second]);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_add_duplicate() {
        let mut ledger = Ledger::new();
        let e = expense("01.01.2024", "Food", 10.0, "a");
        ledger.add(e.clone());
        ledger.add(e.clone());

        assert_eq!(ledger.expense_count(), 2);
        assert_eq!(ledger.category_count(), 1);
    }

    #[test]
    fn test_remove_keeps_category_still_in_use() {
        let first = expense("01.01.2024", "Food", 10.0, "a");
        let second = expense("02.01.2024", "Food", 20.0, "b");
        let mut ledger = Ledger::from_expenses(vec![first.clone(), second.clone()]);

        assert_eq!(ledger.remove(&first), Some(first));
        assert!(ledger.contains_category("Food"));
        assert_consistent(&ledger);

        assert_eq!(ledger.remove(&second), Some(second));
        assert!(ledger.categories().is_empty());
        assert_consistent(&ledger);
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut ledger = Ledger::from_expenses(vec![expense("01.01.2024", "Food", 10.0, "a")]);
        let missing = expense("01.01.2024", "Food", 11.0, "a");

        assert_eq!(ledger.remove(&missing), None);
        assert_eq!(ledger.expense_count(), 1);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_remove_first_of_duplicates_only() {
        let dup = expense("01.01.2024", "Food", 10.0, "a");
        let other = expense("02.01.2024", "Travel", 10.0, "b");
        let mut ledger = Ledger::from_expenses(vec![dup.clone(), other.clone(), dup.clone()]);

        ledger.remove(&dup);

        assert_eq!(ledger.list(), vec![other, dup.clone()]);
        // The remaining duplicate still uses the category
        assert!(ledger.contains_category("Food"));
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_moves_category() {
        let old = expense("01.01.2024", "Food", 10.0, "a");
        let new = expense("01.01.2024", "Travel", 10.0, "a");
        let mut ledger = Ledger::from_expenses(vec![old.clone()]);

        let replaced = ledger.update(&old, new.clone()).unwrap();

        assert_eq!(replaced, old);
        assert!(!ledger.contains_category("Food"));
        assert!(ledger.contains_category("Travel"));
        assert_eq!(ledger.list(), vec![new]);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_keeps_shared_category() {
        let old = expense("01.01.2024", "Food", 10.0, "a");
        let other = expense("02.01.2024", "Food", 20.0, "b");
        let new = expense("01.01.2024", "Travel", 10.0, "a");
        let mut ledger = Ledger::from_expenses(vec![old.clone(), other]);

        ledger.update(&old, new).unwrap();

        assert!(ledger.contains_category("Food"));
        assert!(ledger.contains_category("Travel"));
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_with_duplicate_of_replaced_entry() {
        let dup = expense("01.01.2024", "Food", 10.0, "a");
        let new = expense("01.01.2024", "Travel", 10.0, "a");
        let mut ledger = Ledger::from_expenses(vec![dup.clone(), dup.clone()]);

        ledger.update(&dup, new.clone()).unwrap();

        // The second copy keeps "Food" alive
        assert_eq!(ledger.list(), vec![new, dup]);
        assert!(ledger.contains_category("Food"));
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_preserves_position() {
        let a = expense("01.01.2024", "Food", 10.0, "a");
        let b = expense("02.01.2024", "Rent", 20.0, "b");
        let c = expense("03.01.2024", "Fun", 30.0, "c");
        let b2 = expense("02.01.2024", "Rent", 25.0, "b");
        let mut ledger = Ledger::from_expenses(vec![a.clone(), b.clone(), c.clone()]);

        ledger.update(&b, b2.clone()).unwrap();

        assert_eq!(ledger.list(), vec![a, b2, c]);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_update_missing_leaves_ledger_unchanged() {
        let stored = expense("01.01.2024", "Food", 10.0, "a");
        let missing = expense("09.09.2024", "Food", 99.0, "z");
        let new = expense("01.01.2024", "Travel", 10.0, "a");
        let mut ledger = Ledger::from_expenses(vec![stored.clone()]);

        let result = ledger.update(&missing, new);

        assert_eq!(result, Err(LedgerError::NotFound(missing)));
        assert_eq!(ledger.list(), vec![stored]);
        assert!(!ledger.contains_category("Travel"));
        assert_consistent(&ledger);
    }

    #[test]
    fn test_returned_collections_are_copies() {
        let mut ledger = Ledger::from_expenses(vec![expense("01.01.2024", "Food", 10.0, "a")]);

        let mut list = ledger.list();
        list.clear();
        let mut categories = ledger.categories();
        categories.insert("Bogus".to_string());

        assert_eq!(ledger.expense_count(), 1);
        assert!(!ledger.contains_category("Bogus"));

        ledger.add(expense("02.01.2024", "Rent", 1.0, "b"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_index_consistent_after_every_operation() {
        let pool = [
            expense("01.01.2024", "Food", 10.0, "a"),
            expense("02.01.2024", "Food", 20.0, "b"),
            expense("03.01.2024", "Travel", 30.0, "c"),
            expense("04.01.2024", "Rent", 40.0, "d"),
            expense("05.01.2024", "Fun", 50.0, "e"),
        ];
        let mut ledger = Ledger::new();

        // Deterministic pseudo-random walk over add/remove/update
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let pick = &pool[(seed % pool.len() as u64) as usize];
            let other = &pool[((seed >> 8) % pool.len() as u64) as usize];

            match (seed >> 16) % 3 {
                0 => ledger.add(pick.clone()),
                1 => {
                    let before = ledger.expense_count();
                    let removed = ledger.remove(pick);
                    let expected = if removed.is_some() { before - 1 } else { before };
                    assert_eq!(ledger.expense_count(), expected);
                }
                _ => {
                    let before = ledger.list();
                    if ledger.update(pick, other.clone()).is_err() {
                        assert_eq!(ledger.list(), before);
                    }
                }
            }
            assert_consistent(&ledger);
        }
    }

    #[test]
    fn test_rebuild_categories() {
        let mut ledger = Ledger::from_expenses(vec![expense("01.01.2024", "Food", 10.0, "a")]);
        ledger.rebuild_categories();
        assert_consistent(&ledger);
        assert_eq!(ledger.category_count(), 1);
    }

    #[test]
    fn test_collect_into_ledger() {
        let ledger: Ledger = vec![
            expense("01.01.2024", "Food", 10.0, "a"),
            expense("02.01.2024", "Rent", 20.0, "b"),
        ]
        .into_iter()
        .collect();
        assert_eq!(ledger.category_count(), 2);
        assert_consistent(&ledger);
    }
}
