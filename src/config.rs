//! Reconciliation configuration

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{LedgerSide, ReconcileError, ReconcileResult};

/// Days either side of a transaction's date a counterpart may fall on
pub const DEFAULT_TOLERANCE_DAYS: u32 = 4;

/// Date format used by both source ledgers
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// How the tolerance window matcher consumes candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// One credit-side transaction clears every same-amount candidate in its window
    #[default]
    Sweep,
    /// One credit-side transaction clears only the candidate nearest in date
    Nearest,
}

impl FromStr for WindowPolicy {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep" => Ok(WindowPolicy::Sweep),
            "nearest" => Ok(WindowPolicy::Nearest),
            other => Err(ReconcileError::Config(format!(
                "unknown window policy '{}', expected 'sweep' or 'nearest'",
                other
            ))),
        }
    }
}

/// Settings for one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Display name of the first ledger, also used for output file names
    pub first_name: String,
    /// Display name of the second ledger
    pub second_name: String,
    /// Half-width of the tolerance window in days
    pub tolerance_days: u32,
    /// Value substituted for amount text that does not parse
    pub fallback_amount: BigDecimal,
    pub window_policy: WindowPolicy,
    /// chrono format of the source date column
    pub date_format: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            first_name: "first".to_string(),
            second_name: "second".to_string(),
            tolerance_days: DEFAULT_TOLERANCE_DAYS,
            fallback_amount: BigDecimal::zero(),
            window_policy: WindowPolicy::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from `RECONCILE_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> ReconcileResult<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("RECONCILE_FIRST_NAME") {
            config.first_name = name;
        }
        if let Ok(name) = std::env::var("RECONCILE_SECOND_NAME") {
            config.second_name = name;
        }
        if let Ok(days) = std::env::var("RECONCILE_TOLERANCE_DAYS") {
            config.tolerance_days = days.trim().parse().map_err(|_| {
                ReconcileError::Config(format!("invalid RECONCILE_TOLERANCE_DAYS '{}'", days))
            })?;
        }
        if let Ok(amount) = std::env::var("RECONCILE_FALLBACK_AMOUNT") {
            config.fallback_amount = BigDecimal::from_str(amount.trim()).map_err(|_| {
                ReconcileError::Config(format!("invalid RECONCILE_FALLBACK_AMOUNT '{}'", amount))
            })?;
        }
        if let Ok(policy) = std::env::var("RECONCILE_WINDOW_POLICY") {
            config.window_policy = policy.parse()?;
        }
        if let Ok(format) = std::env::var("RECONCILE_DATE_FORMAT") {
            config.date_format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.first_name.trim().is_empty() || self.second_name.trim().is_empty() {
            return Err(ReconcileError::Config(
                "Ledger names cannot be empty".to_string(),
            ));
        }

        if self.first_name == self.second_name {
            return Err(ReconcileError::Config(format!(
                "Ledger names must differ, both are '{}'",
                self.first_name
            )));
        }

        if self.fallback_amount < BigDecimal::zero() {
            return Err(ReconcileError::Config(format!(
                "Fallback amount cannot be negative: {}",
                self.fallback_amount
            )));
        }

        if self.date_format.trim().is_empty() {
            return Err(ReconcileError::Config(
                "Date format cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Display name of a ledger
    pub fn name_of(&self, side: LedgerSide) -> &str {
        match side {
            LedgerSide::First => &self.first_name,
            LedgerSide::Second => &self.second_name,
        }
    }
}
