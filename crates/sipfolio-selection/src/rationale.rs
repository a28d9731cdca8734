//! Human- and machine-readable account of a selection run.

use serde::{Deserialize, Serialize};
use sipfolio_data::ForecastHorizon;

/// Description of the selection method.
pub const SELECTION_METHOD: &str = "PEG-based stock selection for maximum growth optimization";

/// Description of how diversification is achieved.
pub const DIVERSIFICATION_APPROACH: &str =
    "Sector diversification through Round 1 + PEG-filtered growth stocks in Round 2";

/// Round-1 pick for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPick {
    /// Sector label.
    pub sector: String,
    /// Ticker of the lowest-PEG instrument in the sector.
    pub ticker: String,
    /// Average historical growth rate (percent).
    pub growth: f64,
    /// P/E ratio.
    pub pe_ratio: f64,
    /// P/B ratio, when reported.
    pub pb_ratio: Option<f64>,
    /// PEG ratio.
    pub peg_ratio: f64,
    /// Number of instruments in the sector that passed the quality gate.
    pub sector_size: usize,
}

/// Round-2 addition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTwoAddition {
    /// Ticker.
    pub ticker: String,
    /// Sector label.
    pub sector: String,
    /// PEG ratio (strictly below the threshold).
    pub peg_ratio: f64,
}

/// Counts, picks and criteria describing one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRationale {
    /// Instruments in the universe.
    pub total_universe: usize,
    /// Instruments passing the quality gate.
    pub after_quality_gate: usize,
    /// Sectors represented after the quality gate.
    pub sectors_available: usize,
    /// Instruments selected across both rounds.
    pub instruments_selected: usize,
    /// One entry per Round-1 pick, in sector order.
    pub sector_picks: Vec<SectorPick>,
    /// Round-2 additions, ascending by PEG.
    pub round_two_additions: Vec<RoundTwoAddition>,
    /// Method description.
    pub selection_method: String,
    /// Per-round criteria.
    pub selection_criteria: Vec<String>,
    /// Quality gate criteria.
    pub quality_filters: Vec<String>,
    /// Diversification description.
    pub diversification_approach: String,
    /// Forecast bucket the achieved rate was computed at.
    pub forecast_horizon: ForecastHorizon,
    /// Achieved blended growth rate, formatted as a percentage (`"18.4%"`).
    pub achieved_rate: String,
    /// Advisory feasibility flag.
    pub feasible: bool,
    /// Explanation when the selection is infeasible.
    pub feasibility_note: Option<String>,
    /// Selected instruments that publish no forecast at all.
    pub instruments_without_forecast: usize,
    /// Free-form annotations added by later pipeline stages.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl SelectionRationale {
    /// Round-1 and Round-2 criteria for a given PEG threshold.
    pub fn criteria(peg_threshold: f64) -> Vec<String> {
        vec![
            "Round 1: Lowest PEG ratio per sector (PE / average historical growth)".to_string(),
            format!("Round 2: All remaining stocks with PEG < {peg_threshold}"),
        ]
    }

    /// Quality gate criteria.
    pub fn quality_gate() -> Vec<String> {
        vec![
            "PE Ratio > 0 (valid valuation)".to_string(),
            "Average historical growth > 0 (no negative-growth stocks)".to_string(),
            "Valid PEG ratio calculation".to_string(),
        ]
    }

    /// Attach a note.
    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

/// Format a decimal rate as a one-decimal percentage string.
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
