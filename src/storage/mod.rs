mod repository;

pub use repository::*;

/// Initial schema: users and their position-ordered expenses.
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
