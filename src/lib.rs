#![doc(test(attr(deny(warnings))))]

//! Tally binds the budgeting, aging and journal engine to a company
//! aggregate, a persistence gateway and a notification sink.

pub mod errors;
pub mod session;
pub mod utils;

pub use tally_config as config;
pub use tally_core as engine;
pub use tally_domain as domain;
pub use tally_storage_json as storage_json;

pub use errors::{Result, TallyError};
pub use session::CompanySession;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Tally tracing initialized.");
    });
}
