// Application layer - use cases and orchestration.
// `ExpenseService` binds a user's ledger to the filter/sort and aggregation
// strategies; `AccountService` adds persistence and request handling on top.

mod accounts;
pub mod error;
mod reporting;
mod request;
mod service;

pub use accounts::*;
pub use error::*;
pub use reporting::*;
pub use request::*;
pub use service::*;
