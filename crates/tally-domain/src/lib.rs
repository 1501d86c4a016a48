//! tally-domain
//!
//! Pure domain models (Company, Budget, BudgetCategory, JournalEntry, Invoice).
//! No I/O, no storage, no logging. Only data types, core enums and the
//! invariants that can be enforced on the types themselves.

pub mod budget;
pub mod common;
pub mod company;
pub mod invoice;
pub mod journal;

pub use budget::*;
pub use common::*;
pub use company::*;
pub use invoice::*;
pub use journal::*;
