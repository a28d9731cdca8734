//! Sector-level and market-wide universe statistics.

use crate::instrument::Instrument;
use crate::universe::InstrumentUniverse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate statistics for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSummary {
    /// Sector label.
    pub sector: String,

    /// Number of instruments in the sector.
    pub instrument_count: usize,

    /// Mean historical growth (percent) over instruments that report it.
    pub avg_growth: f64,

    /// Mean P/E over instruments that report it.
    pub avg_pe_ratio: f64,

    /// Mean P/B over instruments that report it.
    pub avg_pb_ratio: f64,

    /// Best-ranked instrument in the sector, if any instrument carries a rank.
    pub top_ranked: Option<String>,
}

impl fmt::Display for SectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} instruments, growth {:.2}%, P/E {:.2}, P/B {:.2}, top {}",
            self.sector,
            self.instrument_count,
            self.avg_growth,
            self.avg_pe_ratio,
            self.avg_pb_ratio,
            self.top_ranked.as_deref().unwrap_or("N/A")
        )
    }
}

/// Market-wide statistics for a universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Total number of instruments.
    pub total_instruments: usize,

    /// Instruments passing the quality gate.
    pub usable_instruments: usize,

    /// Sector labels, sorted.
    pub sectors: Vec<String>,

    /// Mean historical growth (percent).
    pub avg_growth: f64,

    /// Mean P/E.
    pub avg_pe_ratio: f64,

    /// Mean P/B.
    pub avg_pb_ratio: f64,

    /// Per-sector summaries, highest mean growth first.
    pub sector_summaries: Vec<SectorSummary>,
}

/// Mean of the present values, `0.0` when none are present.
fn mean_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn summarize_sector(sector: &str, members: &[&Instrument]) -> SectorSummary {
    let top_ranked = members
        .iter()
        .filter_map(|i| i.overall_rank.map(|r| (r, i.ticker.as_str())))
        .min()
        .map(|(_, t)| t.to_string());

    SectorSummary {
        sector: sector.to_string(),
        instrument_count: members.len(),
        avg_growth: mean_present(members.iter().map(|i| i.avg_historical_growth)),
        avg_pe_ratio: mean_present(members.iter().map(|i| i.pe_ratio)),
        avg_pb_ratio: mean_present(members.iter().map(|i| i.pb_ratio)),
        top_ranked,
    }
}

impl InstrumentUniverse {
    /// Summaries for every sector, sorted by mean growth descending.
    pub fn sector_summaries(&self) -> Vec<SectorSummary> {
        let mut summaries: Vec<SectorSummary> = self
            .sectors()
            .into_iter()
            .map(|sector| summarize_sector(sector, &self.instruments_in_sector(sector)))
            .collect();

        summaries.sort_by(|a, b| b.avg_growth.total_cmp(&a.avg_growth));
        summaries
    }

    /// Market-wide summary.
    pub fn market_summary(&self) -> MarketSummary {
        let mut sectors: Vec<String> = self.sectors().into_iter().map(str::to_string).collect();
        sectors.sort();

        let instruments = self.instruments();
        MarketSummary {
            total_instruments: instruments.len(),
            usable_instruments: self.usable().count(),
            sectors,
            avg_growth: mean_present(instruments.iter().map(|i| i.avg_historical_growth)),
            avg_pe_ratio: mean_present(instruments.iter().map(|i| i.pe_ratio)),
            avg_pb_ratio: mean_present(instruments.iter().map(|i| i.pb_ratio)),
            sector_summaries: self.sector_summaries(),
        }
    }
}
