//! Selection parameters.

use crate::error::SelectionError;
use serde::{Deserialize, Serialize};

/// Configuration for [`PegSelector`](crate::PegSelector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Target annualized growth rate as a decimal (default: 0.15).
    pub target_growth_rate: f64,
    /// Investment horizon in months (default: 24).
    pub horizon_months: u32,
    /// Maximum number of instruments in the portfolio (default: 20).
    pub max_count: usize,
    /// Minimum number of instruments for the selection to count as feasible (default: 8).
    pub min_count: usize,
    /// Round-2 PEG cut-off, exclusive (default: 1.0).
    pub peg_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_growth_rate: 0.15,
            horizon_months: 24,
            max_count: 20,
            min_count: 8,
            peg_threshold: 1.0,
        }
    }
}

impl SelectionConfig {
    /// Check that the parameters can drive a selection.
    ///
    /// # Errors
    /// Returns [`SelectionError::InvalidParameter`] describing the first bad field.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if !self.target_growth_rate.is_finite() {
            return Err(SelectionError::InvalidParameter(format!(
                "target_growth_rate must be finite, got {}",
                self.target_growth_rate
            )));
        }
        if self.horizon_months == 0 {
            return Err(SelectionError::InvalidParameter(
                "horizon_months must be positive".to_string(),
            ));
        }
        if self.max_count == 0 {
            return Err(SelectionError::InvalidParameter(
                "max_count must be at least 1".to_string(),
            ));
        }
        if !self.peg_threshold.is_finite() {
            return Err(SelectionError::InvalidParameter(format!(
                "peg_threshold must be finite, got {}",
                self.peg_threshold
            )));
        }
        Ok(())
    }
}
