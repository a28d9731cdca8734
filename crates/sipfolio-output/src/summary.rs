//! Text and Markdown rendering of a plan.

use crate::export::HoldingExport;
use serde::{Deserialize, Serialize};

/// Flat, presentation-ready view of a plan result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSummary {
    /// Title line.
    pub title: String,
    /// Requested monthly contribution.
    pub monthly_amount: f64,
    /// Horizon in months.
    pub horizon_months: u32,
    /// Target annual growth rate (decimal).
    pub target_rate: f64,
    /// Achieved blended growth rate (decimal).
    pub achieved_rate: f64,
    /// Advisory feasibility flag.
    pub feasible: bool,
    /// Weighting method name.
    pub method: String,
    /// Reconciled holdings.
    pub holdings: Vec<HoldingExport>,
    /// Weight per sector, largest first.
    pub sector_weights: Vec<(String, f64)>,
    /// Realized monthly cost of the whole-share orders.
    pub total_monthly_investment: f64,
    /// Projected value at the horizon.
    pub final_value: f64,
    /// Total contributed over the horizon.
    pub total_investment: f64,
    /// Projected gain.
    pub total_gain: f64,
    /// `final_value / total_investment`.
    pub money_multiplier: f64,
    /// Achieved rate minus the inflation assumption, in percentage points.
    pub inflation_margin: f64,
    /// Notes and warnings.
    pub notes: Vec<String>,
}

impl PlanSummary {
    /// Render as a fixed-width text table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{}\n", self.title));
        output.push_str(&format!(
            "Monthly: {:.0} | Horizon: {} months | Method: {}\n",
            self.monthly_amount, self.horizon_months, self.method
        ));
        output.push_str(&format!(
            "Target: {:.1}% | Achieved: {:.1}% | Feasible: {}\n",
            self.target_rate * 100.0,
            self.achieved_rate * 100.0,
            if self.feasible { "yes" } else { "no" }
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "{:<14} {:<22} {:>10} {:>8} {:>8} {:>6} {:>8}\n",
            "Ticker", "Sector", "Price", "Weight", "Actual", "Shares", "Cost"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for h in &self.holdings {
            output.push_str(&format!(
                "{:<14} {:<22} {:>10.2} {:>7.2}% {:>7.2}% {:>6} {:>8.0}\n",
                h.ticker,
                truncate(&h.sector, 22),
                h.current_price,
                h.weight * 100.0,
                h.actual_weight * 100.0,
                h.whole_shares,
                h.share_cost
            ));
        }

        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<37} {:>42.0}\n",
            "Monthly Share Cost", self.total_monthly_investment
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("Sector Allocation\n");
        for (sector, weight) in &self.sector_weights {
            output.push_str(&format!("  {:<30} {:>7.2}%\n", sector, weight * 100.0));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output.push_str(&format!("Total Invested:   {:>14.0}\n", self.total_investment));
        output.push_str(&format!("Projected Value:  {:>14.0}\n", self.final_value));
        output.push_str(&format!("Projected Gain:   {:>14.0}\n", self.total_gain));
        output.push_str(&format!("Money Multiplier: {:>14.2}x\n", self.money_multiplier));
        output.push_str(&format!(
            "Inflation Margin: {:>13.1}pp\n",
            self.inflation_margin
        ));

        for note in &self.notes {
            output.push_str(&format!("Note: {note}\n"));
        }

        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str(&format!(
            "**Monthly:** {:.0} | **Horizon:** {} months | **Method:** {}\n\n",
            self.monthly_amount, self.horizon_months, self.method
        ));
        output.push_str(&format!(
            "**Target:** {:.1}% | **Achieved:** {:.1}% | **Feasible:** {}\n\n",
            self.target_rate * 100.0,
            self.achieved_rate * 100.0,
            if self.feasible { "yes" } else { "no" }
        ));

        output.push_str("## Holdings\n\n");
        output.push_str("| Ticker | Sector | Price | Weight | Actual Weight | Shares | Cost |\n");
        output.push_str("|--------|--------|-------|--------|---------------|--------|------|\n");
        for h in &self.holdings {
            output.push_str(&format!(
                "| {} | {} | {:.2} | {:.2}% | {:.2}% | {} | {:.0} |\n",
                h.ticker,
                h.sector,
                h.current_price,
                h.weight * 100.0,
                h.actual_weight * 100.0,
                h.whole_shares,
                h.share_cost
            ));
        }
        output.push('\n');

        output.push_str("## Sector Allocation\n\n");
        output.push_str("| Sector | Weight |\n");
        output.push_str("|--------|--------|\n");
        for (sector, weight) in &self.sector_weights {
            output.push_str(&format!("| {} | {:.2}% |\n", sector, weight * 100.0));
        }
        output.push('\n');

        output.push_str("## Projection\n\n");
        output.push_str(&format!(
            "- **Monthly Share Cost:** {:.0}\n",
            self.total_monthly_investment
        ));
        output.push_str(&format!("- **Total Invested:** {:.0}\n", self.total_investment));
        output.push_str(&format!("- **Projected Value:** {:.0}\n", self.final_value));
        output.push_str(&format!("- **Projected Gain:** {:.0}\n", self.total_gain));
        output.push_str(&format!(
            "- **Money Multiplier:** {:.2}x\n",
            self.money_multiplier
        ));
        output.push_str(&format!(
            "- **Inflation Margin:** {:.1}pp\n",
            self.inflation_margin
        ));

        if !self.notes.is_empty() {
            output.push_str("\n## Notes\n\n");
            for note in &self.notes {
                output.push_str(&format!("- {note}\n"));
            }
        }

        output
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width - 1).collect();
        t.push('~');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> PlanSummary {
        PlanSummary {
            title: "SIP Plan".to_string(),
            monthly_amount: 50_000.0,
            horizon_months: 12,
            target_rate: 0.15,
            achieved_rate: 0.12,
            feasible: false,
            method: "max_sharpe".to_string(),
            holdings: vec![HoldingExport {
                ticker: "TCS".to_string(),
                sector: "Information Technology Services Ltd".to_string(),
                current_price: 3900.0,
                weight: 1.0,
                monthly_allocation: 50_000.0,
                whole_shares: 13,
                share_cost: 50_700.0,
                actual_weight: 1.0,
            }],
            sector_weights: vec![("Information Technology".to_string(), 1.0)],
            total_monthly_investment: 50_700.0,
            final_value: 634_125.0,
            total_investment: 600_000.0,
            total_gain: 34_125.0,
            money_multiplier: 1.0569,
            inflation_margin: 6.0,
            notes: vec!["Target not met".to_string()],
        }
    }

    #[test]
    fn test_ascii_table() {
        let text = summary().to_ascii_table();
        assert!(text.contains("SIP Plan"));
        assert!(text.contains("Feasible: no"));
        assert!(text.contains("TCS"));
        assert!(text.contains("Information Technolog~"));
        assert!(text.contains("634125"));
        assert!(text.contains("1.06x"));
        assert!(text.contains("Note: Target not met"));
    }

    #[test]
    fn test_markdown() {
        let md = summary().to_markdown();
        assert!(md.starts_with("# SIP Plan\n"));
        assert!(md.contains("| Ticker | Sector |"));
        assert!(md.contains("| Information Technology | 100.00% |"));
        assert!(md.contains("- **Projected Gain:** 34125"));
        assert!(md.contains("## Notes"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Energy", 10), "Energy");
        assert_eq!(truncate("Consumer Discretionary", 10), "Consumer ~");
    }
}
