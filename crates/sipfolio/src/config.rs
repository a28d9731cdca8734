//! Plan configuration and request boundary validation.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use sipfolio_allocation::OptimizerConfig;
use sipfolio_selection::SelectionConfig;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Explicit configuration record passed into [`PlanEngine`](crate::PlanEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Selection parameters: target rate, horizon, counts and PEG threshold.
    pub selection: SelectionConfig,
    /// Weight optimizer parameters.
    pub optimizer: OptimizerConfig,
    /// Annual inflation assumption in percent (default: 6.0).
    pub inflation_assumption_pct: f64,
    /// Limits applied to user-facing requests.
    pub limits: RequestLimits,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            optimizer: OptimizerConfig::default(),
            inflation_assumption_pct: 6.0,
            limits: RequestLimits::default(),
        }
    }
}

impl PlanConfig {
    /// Parse a JSON configuration; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Per-user configuration file location (`<config dir>/sipfolio/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sipfolio").join("config.json"))
    }

    /// Load the per-user configuration if it exists, defaults otherwise.
    pub fn load_default() -> Result<Self, PlanError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}

/// Ranges a user-facing request must fall in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLimits {
    /// Smallest accepted monthly contribution (default: 50,000).
    pub min_monthly_amount: f64,
    /// Largest accepted monthly contribution (default: 10,000,000).
    pub max_monthly_amount: f64,
    /// Accepted horizons in months (default: 12..=60).
    pub horizon_months: RangeInclusive<u32>,
    /// Accepted target growth rates as decimals (default: 0.08..=0.50).
    pub target_growth_rate: RangeInclusive<f64>,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            min_monthly_amount: 50_000.0,
            max_monthly_amount: 10_000_000.0,
            horizon_months: 12..=60,
            target_growth_rate: 0.08..=0.50,
        }
    }
}

/// A user-facing plan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Monthly contribution.
    pub monthly_amount: f64,
    /// Horizon in months.
    pub horizon_months: u32,
    /// Target annual growth rate as a decimal.
    pub target_growth_rate: f64,
    /// Optional override of the maximum instrument count.
    #[serde(default)]
    pub max_count: Option<usize>,
    /// Optional override of the minimum instrument count.
    #[serde(default)]
    pub min_count: Option<usize>,
    /// Optional override of the Round-2 PEG threshold.
    #[serde(default)]
    pub peg_threshold: Option<f64>,
}

impl PlanRequest {
    /// Request with only the mandatory fields set.
    pub const fn new(monthly_amount: f64, horizon_months: u32, target_growth_rate: f64) -> Self {
        Self {
            monthly_amount,
            horizon_months,
            target_growth_rate,
            max_count: None,
            min_count: None,
            peg_threshold: None,
        }
    }

    /// Check the request against `limits`.
    ///
    /// # Errors
    /// Returns [`PlanError::InvalidParameters`] naming the offending field.
    pub fn validate(&self, limits: &RequestLimits) -> Result<(), PlanError> {
        if !self.monthly_amount.is_finite() || self.monthly_amount <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "monthly amount must be positive, got {}",
                self.monthly_amount
            )));
        }
        if self.monthly_amount < limits.min_monthly_amount {
            return Err(PlanError::InvalidParameters(format!(
                "monthly amount {} is below the minimum of {}",
                self.monthly_amount, limits.min_monthly_amount
            )));
        }
        if self.monthly_amount > limits.max_monthly_amount {
            return Err(PlanError::InvalidParameters(format!(
                "monthly amount {} exceeds the maximum of {}",
                self.monthly_amount, limits.max_monthly_amount
            )));
        }
        if !limits.horizon_months.contains(&self.horizon_months) {
            return Err(PlanError::InvalidParameters(format!(
                "horizon of {} months is outside {}..={}",
                self.horizon_months,
                limits.horizon_months.start(),
                limits.horizon_months.end()
            )));
        }
        if !limits.target_growth_rate.contains(&self.target_growth_rate) {
            return Err(PlanError::InvalidParameters(format!(
                "target growth rate {} is outside {}..={}",
                self.target_growth_rate,
                limits.target_growth_rate.start(),
                limits.target_growth_rate.end()
            )));
        }
        if let (Some(min), Some(max)) = (self.min_count, self.max_count)
            && min > max
        {
            return Err(PlanError::InvalidParameters(format!(
                "min_count {min} exceeds max_count {max}"
            )));
        }
        Ok(())
    }

    /// `config` with this request's parameters applied to its selection settings.
    pub fn apply(&self, config: &PlanConfig) -> PlanConfig {
        let mut config = config.clone();
        let selection = &mut config.selection;
        selection.target_growth_rate = self.target_growth_rate;
        selection.horizon_months = self.horizon_months;
        if let Some(max) = self.max_count {
            selection.max_count = max;
        }
        if let Some(min) = self.min_count {
            selection.min_count = min;
        }
        if let Some(threshold) = self.peg_threshold {
            selection.peg_threshold = threshold;
        }
        config
    }
}
