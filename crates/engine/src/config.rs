use std::fmt;

use serde::Deserialize;

use crate::reconcile::{DuplicatePolicy, ReconcileOptions};
use crate::resolve::{ColumnResolver, FieldRule};

// ---------------------------------------------------------------------------
// Run config
// ---------------------------------------------------------------------------

/// Optional per-run configuration, loaded from TOML. Absent sections fall
/// back to the built-in defaults.
///
/// ```toml
/// [columns]
/// invoice = ["invoice", "no"]
/// amount  = ["amount", "amt"]
/// date    = ["date"]
///
/// [reconcile]
/// duplicates = "report"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub invoice: Option<Vec<String>>,
    #[serde(default)]
    pub amount: Option<Vec<String>>,
    #[serde(default)]
    pub date: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, needles) in [
            ("invoice", &self.columns.invoice),
            ("amount", &self.columns.amount),
            ("date", &self.columns.date),
        ] {
            if let Some(needles) = needles {
                if needles.is_empty() || needles.iter().any(|n| n.trim().is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "columns.{field} must be a non-empty list of non-blank needles"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The column-resolution strategy this config describes; unset fields
    /// keep their default rules.
    pub fn resolver(&self) -> ColumnResolver {
        let defaults = ColumnResolver::default();
        let rule = |needles: &Option<Vec<String>>, default: FieldRule| match needles {
            Some(n) => FieldRule::new(n.iter().cloned()),
            None => default,
        };
        ColumnResolver {
            invoice: rule(&self.columns.invoice, defaults.invoice),
            amount: rule(&self.columns.amount, defaults.amount),
            date: rule(&self.columns.date, defaults.date),
        }
    }

    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            duplicates: self.reconcile.duplicates,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Config validation error (empty needle list, etc.).
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
