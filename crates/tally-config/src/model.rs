use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::ConfigError;

/// Stores user preferences and which company is currently open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// ISO code given to companies created from this config.
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    /// Utilization above this percentage raises a high-utilization insight.
    #[serde(default = "Config::default_high_utilization_percent")]
    pub high_utilization_percent: u32,
    /// Utilization below this percentage raises a low-utilization insight.
    #[serde(default = "Config::default_low_utilization_percent")]
    pub low_utilization_percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_company: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for company data. Defaults to `~/Documents/Tally`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Self::default_currency(),
            currency_symbol: Self::default_currency_symbol(),
            high_utilization_percent: Self::default_high_utilization_percent(),
            low_utilization_percent: Self::default_low_utilization_percent(),
            current_company: None,
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn default_currency_symbol() -> String {
        "$".into()
    }

    pub fn default_high_utilization_percent() -> u32 {
        90
    }

    pub fn default_low_utilization_percent() -> u32 {
        50
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("Tally")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency code cannot be empty".into()));
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "currency symbol cannot be empty".into(),
            ));
        }
        if self.low_utilization_percent >= self.high_utilization_percent {
            return Err(ConfigError::Invalid(format!(
                "low utilization threshold ({}) must be below the high threshold ({})",
                self.low_utilization_percent, self.high_utilization_percent
            )));
        }
        Ok(())
    }
}
