//! Per-instrument allocation records.

use serde::{Deserialize, Serialize};
use sipfolio_data::Instrument;

/// Whole-share order derived from a currency allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAllocation {
    /// Fractional shares the weight implies (`monthly_allocation / current_price`).
    pub target_shares: f64,
    /// Shares actually bought: the rounded target, never fewer than one.
    pub whole_shares: u64,
    /// `whole_shares * current_price`.
    pub share_cost: f64,
    /// Share of the total realized cost.
    pub actual_weight: f64,
    /// Total realized monthly cost across the whole portfolio.
    pub total_monthly_investment: f64,
}

/// Capital assigned to one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Ticker.
    pub ticker: String,
    /// Company name.
    pub company_name: Option<String>,
    /// Sector label.
    pub sector: String,
    /// Investment style label.
    pub investment_style: Option<String>,
    /// Risk level label.
    pub risk_level: Option<String>,
    /// Unit price.
    pub current_price: f64,
    /// P/E ratio.
    pub pe_ratio: Option<f64>,
    /// P/B ratio.
    pub pb_ratio: Option<f64>,
    /// PEG ratio.
    pub peg_ratio: Option<f64>,
    /// Expected return used by the optimizer (percent).
    pub expected_return: f64,
    /// Volatility proxy used by the optimizer.
    pub risk: f64,
    /// Portfolio weight in `[0, 1]`.
    pub weight: f64,
    /// `weight * monthly_amount`.
    pub monthly_allocation: f64,
    /// Whole-share order, filled in by [`reconcile`](crate::reconcile).
    pub shares: Option<ShareAllocation>,
}

impl Allocation {
    /// Allocation for `instrument` with no weight assigned yet.
    pub fn from_instrument(instrument: &Instrument, expected_return: f64, risk: f64) -> Self {
        Self {
            ticker: instrument.ticker.clone(),
            company_name: instrument.company_name.clone(),
            sector: instrument.sector.clone(),
            investment_style: instrument.investment_style.clone(),
            risk_level: instrument.risk_level.clone(),
            current_price: instrument.current_price,
            pe_ratio: instrument.pe_ratio,
            pb_ratio: instrument.pb_ratio,
            peg_ratio: instrument.peg_ratio(),
            expected_return,
            risk,
            weight: 0.0,
            monthly_allocation: 0.0,
            shares: None,
        }
    }

    /// Realized weight after reconciliation, falling back to the target weight.
    pub fn effective_weight(&self) -> f64 {
        self.shares.as_ref().map_or(self.weight, |s| s.actual_weight)
    }
}
