use std::result::Result as StdResult;

use tally_config::ConfigError;
use tally_core::CoreError;
use thiserror::Error;

/// Unified error type for the engine, storage and configuration layers.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("No current company configured")]
    NoCurrentCompany,
}

impl TallyError {
    /// The engine error behind this failure, if any.
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            TallyError::Core(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = StdResult<T, TallyError>;
