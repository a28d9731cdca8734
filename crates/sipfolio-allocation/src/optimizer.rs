//! Weight optimizer.
//!
//! The default method maximizes the Sharpe-like ratio `wᵀr / sqrt(wᵀΣw)` over
//! long-only, fully invested weights. Weights are parameterized as
//! `w = softmax(x)` so every point the solver visits already lies on the
//! simplex, and the unconstrained problem in `x` is solved with L-BFGS and a
//! More-Thuente line search on the analytic gradient, starting from `x = 0`
//! (uniform weights). The search is deterministic.
//!
//! The objective is divided by `sqrt(Σ (max(r_i, 0) / σ_i)²)`, the ratio an
//! unconstrained diagonal portfolio can reach, so costs stay of order one and
//! the gradient tolerance means the same thing for every selection size.

use crate::allocation::Allocation;
use crate::error::AllocationError;
use crate::risk::DiagonalRiskModel;
use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use log::{debug, info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sipfolio_data::Instrument;
use std::fmt;
use std::str::FromStr;

/// Weighting method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    /// Maximize the Sharpe-like ratio under a diagonal covariance.
    #[default]
    MaxSharpe,
    /// `1/n` for every instrument.
    EqualWeight,
    /// Weights proportional to `1/σ_i`.
    RiskParity,
}

impl OptimizationMethod {
    /// Canonical name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MaxSharpe => "max_sharpe",
            Self::EqualWeight => "equal_weight",
            Self::RiskParity => "risk_parity",
        }
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizationMethod {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "max_sharpe" | "mpt" | "sharpe" => Ok(Self::MaxSharpe),
            "equal_weight" | "equal" => Ok(Self::EqualWeight),
            "risk_parity" | "inverse_vol" => Ok(Self::RiskParity),
            _ => Err(AllocationError::UnknownMethod(s.to_string())),
        }
    }
}

/// Configuration for [`WeightOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Weighting method (default: max_sharpe).
    pub method: OptimizationMethod,
    /// Maximum solver iterations (default: 10000).
    pub max_iters: u64,
    /// L-BFGS stopping tolerance on the gradient norm of the normalized objective (default: 1e-7).
    pub grad_tolerance: f64,
    /// Number of correction pairs L-BFGS keeps (default: 10).
    pub history_size: usize,
    /// Expected return used when an instrument has no historical growth, percent (default: 20.0).
    pub default_expected_return: f64,
    /// Volatility proxy used when an instrument has no P/E (default: 0.25).
    pub default_risk: f64,
    /// Allowed deviation of the weight sum from 1 (default: 1e-6).
    pub weight_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            method: OptimizationMethod::MaxSharpe,
            max_iters: 10_000,
            grad_tolerance: 1e-7,
            history_size: 10,
            default_expected_return: 20.0,
            default_risk: 0.25,
            weight_tolerance: 1e-6,
        }
    }
}

/// How the weights were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    /// The iterative solve converged.
    Optimized {
        /// Solver iterations used.
        iterations: u64,
    },
    /// Weights came from a closed-form rule (equal weight, risk parity, single instrument).
    ClosedForm,
    /// The solve failed and equal weights were used instead.
    Degraded {
        /// Why the optimized weights were discarded.
        reason: String,
    },
}

impl OptimizationOutcome {
    /// Whether the equal-weight fallback was used.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Weighted allocations plus portfolio statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPortfolio {
    /// One allocation per instrument, in input order.
    pub allocations: Vec<Allocation>,
    /// Method requested.
    pub method: OptimizationMethod,
    /// How the weights were obtained.
    pub outcome: OptimizationOutcome,
    /// Portfolio expected return (percent).
    pub expected_return: f64,
    /// Portfolio volatility proxy.
    pub volatility: f64,
    /// Sharpe-like ratio of the final weights.
    pub sharpe_ratio: f64,
}

impl OptimizedPortfolio {
    /// Weight vector in allocation order.
    pub fn weights(&self) -> Vec<f64> {
        self.allocations.iter().map(|a| a.weight).collect()
    }
}

fn softmax(x: &[f64]) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }

    let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
    let sum: f64 = exps.iter().sum();

    if sum < 1e-15 || !sum.is_finite() {
        vec![1.0 / x.len() as f64; x.len()]
    } else {
        exps.iter().map(|&e| e / sum).collect()
    }
}

fn equal_weights(n: usize) -> Array1<f64> {
    Array1::from_elem(n, 1.0 / n as f64)
}

/// Scale that puts the optimum of the normalized objective near -1.
fn sharpe_scale(model: &DiagonalRiskModel) -> f64 {
    let bound = model
        .expected_returns()
        .iter()
        .zip(model.volatilities().iter())
        .map(|(&r, &s)| if s > 0.0 { (r.max(0.0) / s).powi(2) } else { f64::INFINITY })
        .sum::<f64>()
        .sqrt();
    if bound.is_finite() && bound > 0.0 { bound } else { 1.0 }
}

/// Negative Sharpe-like ratio of `softmax(x)`, divided by `scale`.
#[derive(Debug, Clone)]
struct SharpeCost {
    model: DiagonalRiskModel,
    scale: f64,
}

impl SharpeCost {
    fn new(model: &DiagonalRiskModel) -> Self {
        Self {
            model: model.clone(),
            scale: sharpe_scale(model),
        }
    }

    /// `∂cost/∂x_j = -w_j (g_j - wᵀg) / scale` with `g = ∂S/∂w`.
    fn logit_gradient(&self, x: &[f64]) -> Result<Vec<f64>, AllocationError> {
        let w = Array1::from(softmax(x));
        let g = self.model.sharpe_gradient(&w)?;
        let mean = w.dot(&g);
        Ok(w
            .iter()
            .zip(g.iter())
            .map(|(wj, gj)| -wj * (gj - mean) / self.scale)
            .collect())
    }
}

impl CostFunction for SharpeCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let w = Array1::from(softmax(x));
        Ok(-self.model.sharpe_ratio(&w)? / self.scale)
    }
}

impl Gradient for SharpeCost {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        Ok(self.logit_gradient(x)?)
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|g| g * g).sum::<f64>().sqrt()
}

/// Risk-adjusted weight optimizer.
#[derive(Debug, Clone, Default)]
pub struct WeightOptimizer {
    config: OptimizerConfig,
}

impl WeightOptimizer {
    /// Create an optimizer with the given configuration.
    pub const fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimizer configuration.
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Weight `instruments` and split `monthly_amount` accordingly.
    ///
    /// `horizon_months` is carried for logging; the risk model does not depend
    /// on it. A failed solve never produces an error: it is reported through
    /// [`OptimizationOutcome::Degraded`] with equal weights.
    ///
    /// # Errors
    /// Returns [`AllocationError::EmptySelection`] when `instruments` is empty.
    pub fn optimize(
        &self,
        instruments: &[Instrument],
        monthly_amount: f64,
        horizon_months: u32,
    ) -> Result<OptimizedPortfolio, AllocationError> {
        let model = DiagonalRiskModel::from_instruments(instruments, &self.config)?;
        let n = model.len();
        info!(
            "Optimizing {} instruments with {} over {} months",
            n, self.config.method, horizon_months
        );

        let (weights, outcome) = match self.config.method {
            _ if n == 1 => (equal_weights(1), OptimizationOutcome::ClosedForm),
            OptimizationMethod::EqualWeight => (equal_weights(n), OptimizationOutcome::ClosedForm),
            OptimizationMethod::RiskParity => match model.inverse_volatility_weights() {
                Some(w) => (w, OptimizationOutcome::ClosedForm),
                None => self.degrade(n, "non-positive volatility proxy, inverse-volatility weights undefined"),
            },
            OptimizationMethod::MaxSharpe => self.solve_max_sharpe(&model),
        };

        let (weights, outcome) = self.checked(weights, outcome);

        let expected_return = model.portfolio_return(&weights)?;
        let volatility = model.portfolio_volatility(&weights)?;
        let sharpe_ratio = model.sharpe_ratio(&weights)?;

        let allocations = instruments
            .iter()
            .zip(weights.iter())
            .zip(model.expected_returns().iter().zip(model.volatilities().iter()))
            .map(|((instrument, &weight), (&ret, &risk))| Allocation {
                weight,
                monthly_allocation: weight * monthly_amount,
                ..Allocation::from_instrument(instrument, ret, risk)
            })
            .collect();

        debug!(
            "Portfolio return {:.3}, volatility {:.4}, sharpe {:.4}",
            expected_return, volatility, sharpe_ratio
        );

        Ok(OptimizedPortfolio {
            allocations,
            method: self.config.method,
            outcome,
            expected_return,
            volatility,
            sharpe_ratio,
        })
    }

    fn degrade(&self, n: usize, reason: impl Into<String>) -> (Array1<f64>, OptimizationOutcome) {
        let reason = reason.into();
        warn!("Portfolio optimization degraded, using equal weights: {reason}");
        (equal_weights(n), OptimizationOutcome::Degraded { reason })
    }

    /// Reject weight vectors that left the simplex.
    fn checked(
        &self,
        weights: Array1<f64>,
        outcome: OptimizationOutcome,
    ) -> (Array1<f64>, OptimizationOutcome) {
        let n = weights.len();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return self.degrade(n, "optimizer produced negative or non-finite weights");
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > self.config.weight_tolerance {
            return self.degrade(n, format!("optimizer weights sum to {sum}, not 1"));
        }
        (weights / sum, outcome)
    }

    fn solve_max_sharpe(&self, model: &DiagonalRiskModel) -> (Array1<f64>, OptimizationOutcome) {
        let n = model.len();
        let cost = SharpeCost::new(model);
        let check = cost.clone();

        let linesearch = match MoreThuenteLineSearch::new().with_c(1e-4, 0.9) {
            Ok(linesearch) => linesearch,
            Err(e) => return self.degrade(n, format!("line search setup failed: {e}")),
        };
        let solver = match LBFGS::new(linesearch, self.config.history_size)
            .with_tolerance_grad(self.config.grad_tolerance)
        {
            Ok(solver) => solver,
            Err(e) => return self.degrade(n, format!("solver setup failed: {e}")),
        };

        let res = match Executor::new(cost, solver)
            .configure(|state| state.param(vec![0.0; n]).max_iters(self.config.max_iters))
            .run()
        {
            Ok(res) => res,
            Err(e) => return self.degrade(n, format!("solver error: {e}")),
        };

        let iterations = res.state.get_iter();
        let reason = res
            .state
            .get_termination_reason()
            .cloned()
            .unwrap_or(TerminationReason::MaxItersReached);
        if reason == TerminationReason::MaxItersReached {
            return self.degrade(
                n,
                format!(
                    "solver did not converge within {} iterations",
                    self.config.max_iters
                ),
            );
        }

        let Some(best) = res.state.best_param else {
            return self.degrade(n, "solver returned no parameters");
        };

        // A line search that stalls at floating-point resolution still leaves
        // an optimum; anything farther out is rejected.
        let grad_norm = match check.logit_gradient(&best) {
            Ok(g) => l2_norm(&g),
            Err(e) => return self.degrade(n, format!("gradient evaluation failed: {e}")),
        };
        if grad_norm.is_nan() || grad_norm > self.config.grad_tolerance * 10.0 {
            return self.degrade(
                n,
                format!("solver stopped ({reason}) with gradient norm {grad_norm:e}"),
            );
        }

        debug!("L-BFGS converged after {iterations} iterations, gradient norm {grad_norm:e}");
        (
            Array1::from(softmax(&best)),
            OptimizationOutcome::Optimized { iterations },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn instruments() -> Vec<Instrument> {
        vec![
            Instrument::new("A", "Energy", 100.0).with_pe(20.0).with_growth(20.0),
            Instrument::new("B", "Financials", 50.0).with_pe(40.0).with_growth(20.0),
            Instrument::new("C", "Utilities", 10.0).with_pe(20.0).with_growth(10.0),
        ]
    }

    #[test]
    fn test_softmax_uniform_at_origin() {
        let w = softmax(&[0.0, 0.0, 0.0, 0.0]);
        for v in w {
            assert_relative_eq!(v, 0.25);
        }
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_max_sharpe_matches_closed_form() {
        // uncorrelated assets: w ∝ r / σ²
        let portfolio = WeightOptimizer::default()
            .optimize(&instruments(), 100_000.0, 24)
            .unwrap();
        assert!(matches!(portfolio.outcome, OptimizationOutcome::Optimized { .. }));

        let raw = [20.0 / 0.04, 20.0 / 0.16, 10.0 / 0.04];
        let total: f64 = raw.iter().sum();
        for (w, r) in portfolio.weights().iter().zip(raw) {
            assert_relative_eq!(*w, r / total, epsilon = 1e-3);
        }

        let uniform_sharpe = DiagonalRiskModel::from_instruments(&instruments(), &OptimizerConfig::default())
            .unwrap()
            .sharpe_ratio(&equal_weights(3))
            .unwrap();
        assert!(portfolio.sharpe_ratio >= uniform_sharpe);
    }

    #[rstest]
    #[case(OptimizationMethod::MaxSharpe)]
    #[case(OptimizationMethod::EqualWeight)]
    #[case(OptimizationMethod::RiskParity)]
    fn test_weights_on_simplex(#[case] method: OptimizationMethod) {
        let optimizer = WeightOptimizer::new(OptimizerConfig {
            method,
            ..Default::default()
        });
        let portfolio = optimizer.optimize(&instruments(), 60_000.0, 36).unwrap();
        let weights = portfolio.weights();
        assert!(weights.iter().all(|w| *w >= 0.0));
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);

        let total: f64 = portfolio.allocations.iter().map(|a| a.monthly_allocation).sum();
        assert_relative_eq!(total, 60_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_instrument_takes_everything() {
        let portfolio = WeightOptimizer::default()
            .optimize(&instruments()[..1], 50_000.0, 12)
            .unwrap();
        assert_eq!(portfolio.outcome, OptimizationOutcome::ClosedForm);
        assert_relative_eq!(portfolio.allocations[0].weight, 1.0);
        assert_relative_eq!(portfolio.allocations[0].monthly_allocation, 50_000.0);
    }

    #[test]
    fn test_iteration_budget_exhaustion_degrades() {
        let optimizer = WeightOptimizer::new(OptimizerConfig {
            max_iters: 1,
            ..Default::default()
        });
        let portfolio = optimizer.optimize(&instruments(), 90_000.0, 24).unwrap();
        assert!(portfolio.outcome.is_degraded());
        for w in portfolio.weights() {
            assert_relative_eq!(w, 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_risk_parity_with_zero_risk_degrades() {
        let optimizer = WeightOptimizer::new(OptimizerConfig {
            method: OptimizationMethod::RiskParity,
            ..Default::default()
        });
        let selection = vec![
            Instrument::new("A", "Energy", 10.0).with_pe(0.0).with_growth(10.0),
            Instrument::new("B", "Energy", 10.0).with_pe(10.0).with_growth(10.0),
        ];
        let portfolio = optimizer.optimize(&selection, 1_000.0, 24).unwrap();
        assert!(portfolio.outcome.is_degraded());
        assert_relative_eq!(portfolio.allocations[0].weight, 0.5);
    }

    #[test]
    fn test_empty_selection() {
        let err = WeightOptimizer::default().optimize(&[], 1_000.0, 24).unwrap_err();
        assert!(matches!(err, AllocationError::EmptySelection));
    }

    #[rstest]
    #[case("mpt", OptimizationMethod::MaxSharpe)]
    #[case("max-sharpe", OptimizationMethod::MaxSharpe)]
    #[case("Equal_Weight", OptimizationMethod::EqualWeight)]
    #[case("risk_parity", OptimizationMethod::RiskParity)]
    fn test_method_from_str(#[case] name: &str, #[case] expected: OptimizationMethod) {
        assert_eq!(name.parse::<OptimizationMethod>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_method() {
        assert!(matches!(
            "black_litterman".parse::<OptimizationMethod>(),
            Err(AllocationError::UnknownMethod(_))
        ));
    }
}
