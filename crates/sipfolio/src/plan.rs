//! Plan orchestration: select, weight, project, reconcile.

use crate::config::PlanConfig;
use crate::error::PlanError;
use crate::projection::{Projection, project};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sipfolio_allocation::{
    Allocation, OptimizationMethod, OptimizationOutcome, WeightOptimizer, reconcile,
    total_share_cost,
};
use sipfolio_data::InstrumentUniverse;
use sipfolio_selection::{PegSelector, SelectionResult};
use std::collections::BTreeMap;

/// Version tag attached to every plan.
pub const MODEL_VERSION: &str = "v1.0";

/// Optimized weight summed by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diversification {
    /// Weight per sector.
    pub sector_weights: BTreeMap<String, f64>,
    /// Weight per investment style, when any allocation carries a style.
    pub style_weights: Option<BTreeMap<String, f64>>,
    /// Weight per risk level, when any allocation carries one.
    pub risk_weights: Option<BTreeMap<String, f64>>,
}

fn weights_by<F>(allocations: &[Allocation], label: F) -> BTreeMap<String, f64>
where
    F: Fn(&Allocation) -> Option<&str>,
{
    let mut weights = BTreeMap::new();
    for a in allocations {
        if let Some(key) = label(a) {
            *weights.entry(key.to_string()).or_insert(0.0) += a.weight;
        }
    }
    weights
}

impl Diversification {
    fn from_allocations(allocations: &[Allocation]) -> Self {
        let non_empty = |m: BTreeMap<String, f64>| (!m.is_empty()).then_some(m);

        Self {
            sector_weights: weights_by(allocations, |a| Some(a.sector.as_str())),
            style_weights: non_empty(weights_by(allocations, |a| a.investment_style.as_deref())),
            risk_weights: non_empty(weights_by(allocations, |a| a.risk_level.as_deref())),
        }
    }

    /// Sector weights, largest first.
    pub fn sectors_by_weight(&self) -> Vec<(String, f64)> {
        let mut sectors: Vec<(String, f64)> = self
            .sector_weights
            .iter()
            .map(|(s, w)| (s.clone(), *w))
            .collect();
        sectors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sectors
    }
}

/// Headline figures of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSummary {
    /// Requested monthly contribution.
    pub monthly_amount: f64,
    /// Horizon in months.
    pub horizon_months: u32,
    /// Horizon in years.
    pub horizon_years: f64,
    /// Target growth rate in percent.
    pub expected_rate_pct: f64,
    /// Achieved blended growth rate in percent.
    pub achieved_rate_pct: f64,
    /// Advisory feasibility flag.
    pub feasible: bool,
    /// Number of instruments held.
    pub instrument_count: usize,
    /// Total contributed over the horizon.
    pub total_investment: f64,
    /// Projected value at the horizon.
    pub final_value: f64,
    /// Projected gain.
    pub total_gain: f64,
    /// `final_value / total_investment`.
    pub money_multiplier: f64,
    /// Inflation assumption in percent.
    pub inflation_assumption_pct: f64,
    /// `achieved_rate_pct - inflation_assumption_pct`.
    pub inflation_margin_pct: f64,
    /// Realized monthly cost of the whole-share orders.
    pub reconciled_monthly_investment: f64,
}

/// Statistics of the weighting step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Weighting method.
    pub method: OptimizationMethod,
    /// How the weights were obtained.
    pub outcome: OptimizationOutcome,
    /// Expected return of the optimized weights (percent).
    pub expected_return: f64,
    /// Volatility proxy of the optimized weights.
    pub volatility: f64,
    /// Sharpe-like ratio of the optimized weights.
    pub sharpe_ratio: f64,
}

/// Complete, immutable result of one plan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Selection with its rationale.
    pub selection: SelectionResult,
    /// Weighting statistics.
    pub portfolio: PortfolioStats,
    /// Reconciled allocations, in selection order.
    pub allocations: Vec<Allocation>,
    /// Value projection at the achieved rate.
    pub projection: Projection,
    /// Weight breakdown by label.
    pub diversification: Diversification,
    /// Headline figures.
    pub summary: InvestmentSummary,
    /// Engine version.
    pub model_version: String,
}

/// Runs the full plan pipeline for a configuration.
#[derive(Debug, Clone, Default)]
pub struct PlanEngine {
    config: PlanConfig,
}

impl PlanEngine {
    /// Create an engine with the given configuration.
    pub const fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub const fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Build a plan for `monthly_amount` over `universe`.
    ///
    /// # Errors
    /// Fails with a data-insufficiency error when nothing can be selected, an
    /// invalid-parameters error for a bad amount or configuration, and a
    /// precision anomaly if the weights or share costs break their invariants.
    pub fn run(
        &self,
        universe: &InstrumentUniverse,
        monthly_amount: f64,
    ) -> Result<PlanResult, PlanError> {
        if !monthly_amount.is_finite() || monthly_amount <= 0.0 {
            return Err(PlanError::InvalidParameters(format!(
                "monthly amount must be positive, got {monthly_amount}"
            )));
        }
        let selection_config = &self.config.selection;
        let horizon_months = selection_config.horizon_months;

        let mut selection = PegSelector::with_config(selection_config.clone()).select(universe)?;

        let optimized = WeightOptimizer::new(self.config.optimizer.clone()).optimize(
            &selection.selected,
            monthly_amount,
            horizon_months,
        )?;
        if let OptimizationOutcome::Degraded { reason } = &optimized.outcome {
            selection
                .rationale
                .add_note(format!("Optimization degraded to equal weights: {reason}"));
        }
        self.check_weights(&optimized.allocations)?;

        let projection = project(monthly_amount, horizon_months, selection.achieved_growth_rate)?;

        let allocations = reconcile(&optimized.allocations)?;
        self.check_shares(&allocations)?;

        let diversification = Diversification::from_allocations(&allocations);
        let reconciled_monthly_investment = total_share_cost(&allocations);

        let achieved_rate_pct = selection.achieved_growth_rate * 100.0;
        let inflation = self.config.inflation_assumption_pct;
        let s = &projection.summary;
        let summary = InvestmentSummary {
            monthly_amount,
            horizon_months,
            horizon_years: f64::from(horizon_months) / 12.0,
            expected_rate_pct: selection_config.target_growth_rate * 100.0,
            achieved_rate_pct,
            feasible: selection.feasible,
            instrument_count: allocations.len(),
            total_investment: s.total_investment,
            final_value: s.final_value,
            total_gain: s.total_gain,
            money_multiplier: s.money_multiplier,
            inflation_assumption_pct: inflation,
            inflation_margin_pct: achieved_rate_pct - inflation,
            reconciled_monthly_investment,
        };

        if !selection.feasible {
            warn!(
                "Plan infeasible: {}",
                selection
                    .rationale
                    .feasibility_note
                    .as_deref()
                    .unwrap_or("target not met")
            );
        }
        info!(
            "Plan complete: {} instruments, achieved {:.1}%, final value {:.0}, monthly cost {:.0}",
            summary.instrument_count, achieved_rate_pct, summary.final_value, reconciled_monthly_investment
        );

        Ok(PlanResult {
            selection,
            portfolio: PortfolioStats {
                method: optimized.method,
                outcome: optimized.outcome,
                expected_return: optimized.expected_return,
                volatility: optimized.volatility,
                sharpe_ratio: optimized.sharpe_ratio,
            },
            allocations,
            projection,
            diversification,
            summary,
            model_version: MODEL_VERSION.to_string(),
        })
    }

    fn check_weights(&self, allocations: &[Allocation]) -> Result<(), PlanError> {
        let tolerance = self.config.optimizer.weight_tolerance;
        if let Some(a) = allocations.iter().find(|a| a.weight.is_nan() || a.weight < 0.0) {
            return Err(PlanError::PrecisionAnomaly(format!(
                "negative or undefined weight {} for {}",
                a.weight, a.ticker
            )));
        }
        let sum: f64 = allocations.iter().map(|a| a.weight).sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(PlanError::PrecisionAnomaly(format!(
                "weights sum to {sum}, expected 1 within {tolerance}"
            )));
        }
        Ok(())
    }

    fn check_shares(&self, allocations: &[Allocation]) -> Result<(), PlanError> {
        let tolerance = self.config.optimizer.weight_tolerance;
        let mut actual_sum = 0.0;
        for a in allocations {
            let Some(shares) = &a.shares else {
                return Err(PlanError::PrecisionAnomaly(format!(
                    "{} was not reconciled",
                    a.ticker
                )));
            };
            if shares.share_cost.is_nan() || shares.share_cost < 0.0 || shares.whole_shares == 0 {
                return Err(PlanError::PrecisionAnomaly(format!(
                    "{} reconciled to {} shares costing {}",
                    a.ticker, shares.whole_shares, shares.share_cost
                )));
            }
            actual_sum += shares.actual_weight;
        }
        if (actual_sum - 1.0).abs() > tolerance {
            return Err(PlanError::PrecisionAnomaly(format!(
                "realized weights sum to {actual_sum}"
            )));
        }
        Ok(())
    }
}
