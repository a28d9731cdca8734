//! Mapping plan results into report, summary and export views.

use crate::plan::PlanResult;
use crate::projection::Projection;
use chrono::NaiveDate;
use sipfolio_output::{
    HoldingExport, PlanSummary, PortfolioExport, ProjectionExport, ProjectionRow, Report,
    ReportBuilder, ReportError,
};

impl Projection {
    /// Schedule view for export.
    pub fn to_export(&self) -> ProjectionExport {
        ProjectionExport {
            monthly_amount: self.monthly_amount,
            annual_growth_rate: self.annual_growth_rate,
            rows: self
                .points
                .iter()
                .map(|p| ProjectionRow {
                    month: p.month,
                    cumulative_invested: p.cumulative_invested,
                    projected_value: p.projected_value,
                    gain: p.gain,
                })
                .collect(),
        }
    }
}

impl PlanResult {
    /// Reconciled holdings.
    pub fn holdings(&self) -> Vec<HoldingExport> {
        self.allocations
            .iter()
            .map(|a| {
                let (whole_shares, share_cost) =
                    a.shares.as_ref().map_or((0, 0.0), |s| (s.whole_shares, s.share_cost));
                HoldingExport {
                    ticker: a.ticker.clone(),
                    sector: a.sector.clone(),
                    current_price: a.current_price,
                    weight: a.weight,
                    monthly_allocation: a.monthly_allocation,
                    whole_shares,
                    share_cost,
                    actual_weight: a.effective_weight(),
                }
            })
            .collect()
    }

    /// Holdings view dated `date`.
    pub fn to_portfolio_export(&self, name: impl Into<String>, date: NaiveDate) -> PortfolioExport {
        PortfolioExport::new(name.into(), date, self.holdings())
    }

    /// Flat summary for text and Markdown rendering.
    pub fn to_summary(&self, title: impl Into<String>) -> PlanSummary {
        let mut notes = Vec::new();
        if let Some(note) = &self.selection.rationale.feasibility_note {
            notes.push(note.clone());
        }
        notes.extend(self.selection.rationale.notes.iter().cloned());

        PlanSummary {
            title: title.into(),
            monthly_amount: self.summary.monthly_amount,
            horizon_months: self.summary.horizon_months,
            target_rate: self.summary.expected_rate_pct / 100.0,
            achieved_rate: self.selection.achieved_growth_rate,
            feasible: self.selection.feasible,
            method: self.portfolio.method.to_string(),
            holdings: self.holdings(),
            sector_weights: self.diversification.sectors_by_weight(),
            total_monthly_investment: self.summary.reconciled_monthly_investment,
            final_value: self.summary.final_value,
            total_investment: self.summary.total_investment,
            total_gain: self.summary.total_gain,
            money_multiplier: self.summary.money_multiplier,
            inflation_margin: self.summary.inflation_margin_pct,
            notes,
        }
    }

    /// Timestamped report wrapping the whole result.
    pub fn to_report(&self, title: impl Into<String>) -> Result<Report, ReportError> {
        Ok(ReportBuilder::new()
            .title(title)
            .horizon_months(self.summary.horizon_months)
            .model_version(self.model_version.clone())
            .contents(self)?
            .build())
    }
}
