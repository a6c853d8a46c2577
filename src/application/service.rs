use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::domain::{
    CategoryTotal, DateCategoryFilter, Expense, ExpenseCalculator, ExpenseFilter, LedgerError,
    Price, PriceTotal, User, by_price_descending, category_totals,
};

use super::ExpenseReport;

/// Expense operations against a user's ledger.
///
/// Filtering/sorting and aggregation are pluggable strategies fixed at
/// construction; [`ExpenseService::new`] uses the default implementations.
#[derive(Debug, Clone, Default)]
pub struct ExpenseService<F = DateCategoryFilter, C = PriceTotal> {
    filter: F,
    calculator: C,
}

impl ExpenseService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: ExpenseFilter, C: ExpenseCalculator> ExpenseService<F, C> {
    pub fn with_strategies(filter: F, calculator: C) -> Self {
        Self { filter, calculator }
    }

    pub fn add_for(&self, user: &mut User, expense: Expense) {
        user.ledger_mut().add(expense);
    }

    /// Remove the first matching expense; `None` if the user has no such expense.
    pub fn remove_for(&self, user: &mut User, expense: &Expense) -> Option<Expense> {
        user.ledger_mut().remove(expense)
    }

    pub fn update_for(
        &self,
        user: &mut User,
        old: &Expense,
        new: Expense,
    ) -> Result<Expense, LedgerError> {
        user.ledger_mut().update(old, new)
    }

    /// The canonical "show expenses" view: filtered, most expensive first.
    pub fn filter_and_sort_for(
        &self,
        user: &User,
        category: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, LedgerError> {
        let filtered = self
            .filter
            .filter(user.ledger().as_slice(), start, end, category)?;
        Ok(self.filter.sort(&filtered, by_price_descending))
    }

    /// The canonical view together with its total.
    pub fn report_for(
        &self,
        user: &User,
        category: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseReport, LedgerError> {
        let expenses = self.filter_and_sort_for(user, category, start, end)?;
        let total = self.total_of(&expenses);
        Ok(ExpenseReport { expenses, total })
    }

    pub fn all_for(&self, user: &User) -> Vec<Expense> {
        user.ledger().list()
    }

    pub fn categories_for(&self, user: &User) -> HashSet<String> {
        user.ledger().categories()
    }

    pub fn total_for(&self, user: &User) -> Price {
        self.total_of(user.ledger().as_slice())
    }

    pub fn total_of(&self, expenses: &[Expense]) -> Price {
        self.calculator.total(expenses)
    }

    pub fn sorted_for<O>(&self, user: &User, compare: O) -> Vec<Expense>
    where
        O: FnMut(&Expense, &Expense) -> Ordering,
    {
        self.filter.sort(user.ledger().as_slice(), compare)
    }

    pub fn category_totals_for(&self, user: &User) -> Vec<CategoryTotal> {
        category_totals(user.ledger().as_slice())
    }

    /// Resolve a value-equal expense to the stored one.
    pub fn find<'a>(&self, user: &'a User, expense: &Expense) -> Option<&'a Expense> {
        user.ledger().iter().find(|e| *e == expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SortKey;

    fn expense(date: &str, category: &str, price: Price, description: &str) -> Expense {
        Expense::parse(date, category, price, description).unwrap()
    }

    fn user_with(expenses: Vec<Expense>) -> User {
        User::with_expenses("alice", "pw", expenses).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_add_and_remove_for_user() {
        let service = ExpenseService::new();
        let mut user = User::new("alice", "pw").unwrap();
        let e = expense("01.01.2024", "Food", 10.0, "a");

        service.add_for(&mut user, e.clone());
        assert_eq!(service.all_for(&user), vec![e.clone()]);
        assert!(service.categories_for(&user).contains("Food"));

        assert_eq!(service.remove_for(&mut user, &e), Some(e.clone()));
        assert!(service.all_for(&user).is_empty());
        assert!(service.categories_for(&user).is_empty());

        assert_eq!(service.remove_for(&mut user, &e), None);
    }

    #[test]
    fn test_filter_and_sort_is_price_descending() {
        let service = ExpenseService::new();
        let user = user_with(vec![
            expense("01.01.2024", "Food", 10.0, "a"),
            expense("02.01.2024", "Food", 300.0, "b"),
            expense("03.01.2024", "Rent", 5000.0, "c"),
            expense("04.01.2024", "Food", 45.0, "d"),
        ]);

        let all = service.filter_and_sort_for(&user, None, None, None).unwrap();
        let prices: Vec<Price> = all.iter().map(Expense::price).collect();
        assert_eq!(prices, vec![5000.0, 300.0, 45.0, 10.0]);

        let food = service
            .filter_and_sort_for(&user, Some("Food"), Some(date("2024-01-02")), None)
            .unwrap();
        let prices: Vec<Price> = food.iter().map(Expense::price).collect();
        assert_eq!(prices, vec![300.0, 45.0]);
    }

    #[test]
    fn test_filter_and_sort_rejects_inverted_range() {
        let service = ExpenseService::new();
        let user = user_with(vec![expense("01.01.2024", "Food", 10.0, "a")]);

        let result =
            service.filter_and_sort_for(&user, None, Some(date("2024-02-01")), Some(date("2024-01-01")));
        assert!(matches!(result, Err(LedgerError::InvalidRange { .. })));
    }

    #[test]
    fn test_totals() {
        let service = ExpenseService::new();
        let user = user_with(vec![
            expense("01.01.2024", "Food", 75.0, "a"),
            expense("02.01.2024", "Food", 150.0, "b"),
            expense("03.01.2024", "Rent", 750.0, "c"),
        ]);

        assert_eq!(service.total_for(&user), 975.0);
        assert_eq!(service.total_of(&[]), 0.0);

        let report = service.report_for(&user, Some("Food"), None, None).unwrap();
        assert_eq!(report.expenses.len(), 2);
        assert_eq!(report.total, 225.0);
    }

    #[test]
    fn test_sorted_for() {
        let service = ExpenseService::new();
        let user = user_with(vec![
            expense("03.01.2024", "Food", 10.0, "a"),
            expense("01.01.2024", "Rent", 20.0, "b"),
        ]);

        let sorted = service.sorted_for(&user, |a, b| SortKey::Date.compare(a, b));
        assert_eq!(sorted[0].description(), "b");
        // Ledger order is untouched
        assert_eq!(service.all_for(&user)[0].description(), "a");
    }

    #[test]
    fn test_find_resolves_value_equal_expense() {
        let service = ExpenseService::new();
        let stored = expense("01.01.2024", "Food", 10.0, "a");
        let user = user_with(vec![stored.clone()]);

        let lookup = expense("01.01.2024", "Food", 10.0, "a");
        assert_eq!(service.find(&user, &lookup), Some(&stored));

        let missing = expense("01.01.2024", "Food", 10.5, "a");
        assert_eq!(service.find(&user, &missing), None);
    }

    #[test]
    fn test_update_for_user() {
        let service = ExpenseService::new();
        let old = expense("01.01.2024", "Food", 10.0, "a");
        let new = expense("01.01.2024", "Travel", 10.0, "a");
        let mut user = user_with(vec![old.clone()]);

        service.update_for(&mut user, &old, new).unwrap();

        let categories = service.categories_for(&user);
        assert!(categories.contains("Travel"));
        assert!(!categories.contains("Food"));

        assert!(matches!(
            service.update_for(&mut user, &old, old.clone()),
            Err(LedgerError::NotFound(_))
        ));
    }

    struct NoFilter;

    impl ExpenseFilter for NoFilter {
        fn filter(
            &self,
            expenses: &[Expense],
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
            _category: Option<&str>,
        ) -> Result<Vec<Expense>, LedgerError> {
            Ok(expenses.to_vec())
        }

        fn sort<O>(&self, expenses: &[Expense], _compare: O) -> Vec<Expense>
        where
            O: FnMut(&Expense, &Expense) -> Ordering,
        {
            expenses.to_vec()
        }
    }

    struct CountCalculator;

    impl ExpenseCalculator for CountCalculator {
        fn total(&self, expenses: &[Expense]) -> Price {
            expenses.len() as Price
        }
    }

    #[test]
    fn test_custom_strategies() {
        let service = ExpenseService::with_strategies(NoFilter, CountCalculator);
        let user = user_with(vec![
            expense("01.01.2024", "Food", 10.0, "a"),
            expense("02.01.2024", "Rent", 500.0, "b"),
        ]);

        let view = service
            .filter_and_sort_for(&user, Some("Rent"), None, None)
            .unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].description(), "a");
        assert_eq!(service.total_for(&user), 2.0);
    }
}
