//! Diagonal risk model.
//!
//! Each instrument contributes an expected return `r_i` and a volatility proxy
//! `σ_i`. Instruments are modeled as uncorrelated, so:
//!
//! ```text
//! Var(R_p) = wᵀΣw = Σ w_i² σ_i²   with Σ = diag(σ²)
//! ```

use crate::error::AllocationError;
use crate::optimizer::OptimizerConfig;
use ndarray::{Array1, Array2};
use sipfolio_data::Instrument;

/// Expected returns and volatility proxies for a set of instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalRiskModel {
    expected_returns: Array1<f64>,
    volatilities: Array1<f64>,
}

impl DiagonalRiskModel {
    /// Build a model from explicit vectors.
    ///
    /// # Errors
    /// Returns [`AllocationError::EmptySelection`] for empty input and
    /// [`AllocationError::DimensionMismatch`] if the lengths differ.
    pub fn new(expected_returns: Vec<f64>, volatilities: Vec<f64>) -> Result<Self, AllocationError> {
        if expected_returns.is_empty() {
            return Err(AllocationError::EmptySelection);
        }
        if expected_returns.len() != volatilities.len() {
            return Err(AllocationError::DimensionMismatch {
                expected: expected_returns.len(),
                actual: volatilities.len(),
            });
        }
        Ok(Self {
            expected_returns: Array1::from(expected_returns),
            volatilities: Array1::from(volatilities),
        })
    }

    /// Model for a selection: return is the average historical growth (percent)
    /// and risk is `PE / 100`, each replaced by the configured default when absent.
    pub fn from_instruments(
        instruments: &[Instrument],
        config: &OptimizerConfig,
    ) -> Result<Self, AllocationError> {
        let returns = instruments
            .iter()
            .map(|i| i.avg_historical_growth.unwrap_or(config.default_expected_return))
            .collect();
        let risks = instruments
            .iter()
            .map(|i| i.pe_ratio.map_or(config.default_risk, |pe| pe / 100.0))
            .collect();
        Self::new(returns, risks)
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.expected_returns.len()
    }

    /// Whether the model is empty (never true for a constructed model).
    pub fn is_empty(&self) -> bool {
        self.expected_returns.is_empty()
    }

    /// Expected returns.
    pub const fn expected_returns(&self) -> &Array1<f64> {
        &self.expected_returns
    }

    /// Volatility proxies.
    pub const fn volatilities(&self) -> &Array1<f64> {
        &self.volatilities
    }

    /// Covariance matrix `diag(σ²)`.
    pub fn covariance(&self) -> Array2<f64> {
        Array2::from_diag(&self.volatilities.mapv(|v| v * v))
    }

    fn check(&self, weights: &Array1<f64>) -> Result<(), AllocationError> {
        if weights.len() == self.len() {
            Ok(())
        } else {
            Err(AllocationError::DimensionMismatch {
                expected: self.len(),
                actual: weights.len(),
            })
        }
    }

    /// Portfolio expected return `wᵀr`.
    pub fn portfolio_return(&self, weights: &Array1<f64>) -> Result<f64, AllocationError> {
        self.check(weights)?;
        Ok(weights.dot(&self.expected_returns))
    }

    /// Portfolio variance `wᵀΣw`.
    pub fn portfolio_variance(&self, weights: &Array1<f64>) -> Result<f64, AllocationError> {
        self.check(weights)?;
        Ok(weights
            .iter()
            .zip(self.volatilities.iter())
            .map(|(w, v)| (w * v).powi(2))
            .sum())
    }

    /// Portfolio volatility.
    pub fn portfolio_volatility(&self, weights: &Array1<f64>) -> Result<f64, AllocationError> {
        Ok(self.portfolio_variance(weights)?.sqrt())
    }

    /// Sharpe-like ratio `wᵀr / sqrt(wᵀΣw)`.
    ///
    /// With zero volatility the ratio degrades to the plain return `wᵀr`, so the
    /// objective stays finite.
    pub fn sharpe_ratio(&self, weights: &Array1<f64>) -> Result<f64, AllocationError> {
        let ret = self.portfolio_return(weights)?;
        let vol = self.portfolio_volatility(weights)?;
        Ok(if vol > 0.0 { ret / vol } else { ret })
    }

    /// Gradient of [`sharpe_ratio`](Self::sharpe_ratio) with respect to the weights.
    ///
    /// `∂S/∂w_i = r_i / σ_p - (wᵀr) w_i σ_i² / σ_p³`, or `r` when `σ_p = 0`.
    pub fn sharpe_gradient(&self, weights: &Array1<f64>) -> Result<Array1<f64>, AllocationError> {
        let ret = self.portfolio_return(weights)?;
        let var = self.portfolio_variance(weights)?;
        if var <= 0.0 {
            return Ok(self.expected_returns.clone());
        }
        let vol = var.sqrt();
        let risk_term = weights * &self.volatilities.mapv(|v| v * v) * (ret / (var * vol));
        Ok(&self.expected_returns / vol - risk_term)
    }

    /// Inverse-volatility weights, `None` if any volatility is not positive.
    pub fn inverse_volatility_weights(&self) -> Option<Array1<f64>> {
        if self.volatilities.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return None;
        }
        let inv = self.volatilities.mapv(|v| 1.0 / v);
        let total = inv.sum();
        Some(inv / total)
    }
}
