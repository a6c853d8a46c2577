mod aggregate;
mod expense;
mod filter;
mod ledger;
mod money;
mod user;

pub use aggregate::*;
pub use expense::*;
pub use filter::*;
pub use ledger::*;
pub use money::*;
pub use user::*;
