//! tally-core
//!
//! Budgeting, aging and journal services for Tally.
//! Depends on tally-domain. No terminal I/O and no direct filesystem access;
//! persistence and notifications go through the traits in [`storage`] and
//! [`notification`].

pub mod aging_service;
pub mod budget_service;
pub mod error;
pub mod journal_service;
pub mod money;
pub mod notification;
pub mod storage;
pub mod time;

pub use aging_service::*;
pub use budget_service::*;
pub use error::{CoreError, CoreResult, EntityKind};
pub use journal_service::*;
pub use money::*;
pub use notification::*;
pub use storage::*;
pub use time::*;
