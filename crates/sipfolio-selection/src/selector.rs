//! Two-round PEG selector.
//!
//! Round 1 takes the cheapest instrument (lowest PEG) from every sector that
//! survives the quality gate. Round 2 tops the portfolio up with any other
//! survivor whose PEG is strictly below the threshold, cheapest first, until
//! `max_count` is reached. Round 1 is never trimmed, so a universe with more
//! sectors than `max_count` yields one pick per sector and no Round-2 additions.

use crate::config::SelectionConfig;
use crate::error::SelectionError;
use crate::rationale::{
    DIVERSIFICATION_APPROACH, RoundTwoAddition, SELECTION_METHOD, SectorPick, SelectionRationale,
    format_rate,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sipfolio_data::{ForecastHorizon, Instrument, InstrumentUniverse};
use std::cmp::Ordering;

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected instruments: Round-1 picks in sector order, then Round-2 additions.
    pub selected: Vec<Instrument>,
    /// Advisory flag: achieved rate meets the target and enough instruments were found.
    pub feasible: bool,
    /// Unweighted mean forecast at the resolved horizon, as a decimal.
    pub achieved_growth_rate: f64,
    /// Stage-by-stage account of the run.
    pub rationale: SelectionRationale,
}

impl SelectionResult {
    /// Number of selected instruments.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected tickers in selection order.
    pub fn tickers(&self) -> Vec<&str> {
        self.selected.iter().map(|i| i.ticker.as_str()).collect()
    }
}

/// Instrument that passed the quality gate, with its PEG.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    instrument: &'a Instrument,
    peg: f64,
}

/// Lowest PEG first, then best overall rank (unranked last), then ticker.
fn by_attractiveness(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    let rank_key = |c: &Candidate<'_>| (c.instrument.overall_rank.is_none(), c.instrument.overall_rank);
    a.peg
        .total_cmp(&b.peg)
        .then_with(|| rank_key(a).cmp(&rank_key(b)))
        .then_with(|| a.instrument.ticker.cmp(&b.instrument.ticker))
}

/// Sector-aware PEG selector.
#[derive(Debug, Clone, Default)]
pub struct PegSelector {
    config: SelectionConfig,
}

impl PegSelector {
    /// Create a selector with the given configuration.
    pub const fn with_config(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Selector configuration.
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Run the quality gate and both selection rounds over `universe`.
    ///
    /// # Errors
    /// Returns [`SelectionError::EmptyUniverse`] or
    /// [`SelectionError::NoUsableInstruments`] when there is nothing to select
    /// from, and [`SelectionError::InvalidParameter`] for a bad configuration.
    pub fn select(&self, universe: &InstrumentUniverse) -> Result<SelectionResult, SelectionError> {
        let config = &self.config;
        config.validate()?;

        info!(
            "Selecting for target {:.1}% over {} months (max {}, min {}, PEG < {})",
            config.target_growth_rate * 100.0,
            config.horizon_months,
            config.max_count,
            config.min_count,
            config.peg_threshold
        );

        if universe.is_empty() {
            return Err(SelectionError::EmptyUniverse);
        }

        let candidates: Vec<Candidate<'_>> = universe
            .instruments()
            .iter()
            .filter_map(|instrument| instrument.peg_ratio().map(|peg| Candidate { instrument, peg }))
            .collect();

        if candidates.is_empty() {
            return Err(SelectionError::NoUsableInstruments {
                universe_size: universe.len(),
            });
        }
        debug!(
            "Quality gate: {} of {} instruments usable",
            candidates.len(),
            universe.len()
        );

        let horizon = ForecastHorizon::nearest(config.horizon_months);

        let mut sectors: Vec<&str> = Vec::new();
        for c in &candidates {
            if !sectors.contains(&c.instrument.sector.as_str()) {
                sectors.push(c.instrument.sector.as_str());
            }
        }

        // Round 1
        let mut picked: Vec<Candidate<'_>> = Vec::with_capacity(config.max_count.max(sectors.len()));
        let mut sector_picks = Vec::with_capacity(sectors.len());
        for sector in &sectors {
            let members: Vec<&Candidate<'_>> = candidates
                .iter()
                .filter(|c| c.instrument.sector == *sector)
                .collect();
            let Some(best) = members.iter().copied().min_by(|a, b| by_attractiveness(a, b)) else {
                continue;
            };

            debug!("Round 1 {}: {} (PEG {:.3})", sector, best.instrument.ticker, best.peg);
            sector_picks.push(SectorPick {
                sector: (*sector).to_string(),
                ticker: best.instrument.ticker.clone(),
                growth: best.instrument.avg_historical_growth.unwrap_or_default(),
                pe_ratio: best.instrument.pe_ratio.unwrap_or_default(),
                pb_ratio: best.instrument.pb_ratio,
                peg_ratio: best.peg,
                sector_size: members.len(),
            });
            picked.push(*best);
        }

        // Round 2
        let remaining_slots = config.max_count.saturating_sub(picked.len());
        let mut round_two: Vec<Candidate<'_>> = candidates
            .iter()
            .filter(|c| c.peg < config.peg_threshold)
            .filter(|c| !picked.iter().any(|p| p.instrument.ticker == c.instrument.ticker))
            .copied()
            .collect();
        round_two.sort_by(by_attractiveness);
        round_two.truncate(remaining_slots);

        let round_two_additions: Vec<RoundTwoAddition> = round_two
            .iter()
            .map(|c| RoundTwoAddition {
                ticker: c.instrument.ticker.clone(),
                sector: c.instrument.sector.clone(),
                peg_ratio: c.peg,
            })
            .collect();
        debug!("Round 2: {} additions", round_two_additions.len());
        picked.extend(round_two);

        let selected: Vec<Instrument> = picked.iter().map(|c| c.instrument.clone()).collect();

        let forecasts: Vec<f64> = selected
            .iter()
            .filter_map(|i| i.forecast_nearest(horizon).map(|(_, v)| v))
            .collect();
        let instruments_without_forecast = selected.len() - forecasts.len();
        let achieved_growth_rate = if forecasts.is_empty() {
            0.0
        } else {
            forecasts.iter().sum::<f64>() / forecasts.len() as f64 / 100.0
        };

        let feasible =
            achieved_growth_rate >= config.target_growth_rate && selected.len() >= config.min_count;

        let feasibility_note = (!feasible).then(|| {
            let mut note = format!(
                "Target {} not achieved with sector diversification approach. Best achievable: {}",
                format_rate(config.target_growth_rate),
                format_rate(achieved_growth_rate)
            );
            if selected.len() < config.min_count {
                note.push_str(&format!(
                    " ({} instruments selected, {} required)",
                    selected.len(),
                    config.min_count
                ));
            }
            note
        });

        let mut rationale = SelectionRationale {
            total_universe: universe.len(),
            after_quality_gate: candidates.len(),
            sectors_available: sectors.len(),
            instruments_selected: selected.len(),
            sector_picks,
            round_two_additions,
            selection_method: SELECTION_METHOD.to_string(),
            selection_criteria: SelectionRationale::criteria(config.peg_threshold),
            quality_filters: SelectionRationale::quality_gate(),
            diversification_approach: DIVERSIFICATION_APPROACH.to_string(),
            forecast_horizon: horizon,
            achieved_rate: format_rate(achieved_growth_rate),
            feasible,
            feasibility_note,
            instruments_without_forecast,
            notes: Vec::new(),
        };
        if sectors.len() > config.max_count {
            rationale.add_note(format!(
                "Round 1 covers {} sectors, above max_count {}; no Round 2 slots left",
                sectors.len(),
                config.max_count
            ));
        }
        if instruments_without_forecast > 0 {
            rationale.add_note(format!(
                "{instruments_without_forecast} selected instruments publish no forecast and are excluded from the achieved rate"
            ));
        }

        info!(
            "Selection complete: {} instruments, {} achieved at {}",
            selected.len(),
            rationale.achieved_rate,
            horizon
        );

        Ok(SelectionResult {
            selected,
            feasible,
            achieved_growth_rate,
            rationale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn inst(ticker: &str, sector: &str, pe: f64, growth: f64, f24: f64) -> Instrument {
        Instrument::new(ticker, sector, 100.0)
            .with_pe(pe)
            .with_growth(growth)
            .with_forecast(ForecastHorizon::TwentyFourMonths, f24)
    }

    fn universe(instruments: Vec<Instrument>) -> InstrumentUniverse {
        InstrumentUniverse::new(instruments).unwrap()
    }

    fn selector(max_count: usize, min_count: usize, peg_threshold: f64) -> PegSelector {
        PegSelector::with_config(SelectionConfig {
            max_count,
            min_count,
            peg_threshold,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_universe_is_an_error() {
        let err = PegSelector::default()
            .select(&InstrumentUniverse::empty())
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptyUniverse));
        assert!(err.is_data_insufficiency());
    }

    #[test]
    fn test_no_usable_instruments() {
        let u = universe(vec![
            Instrument::new("A", "Energy", 10.0).with_pe(-5.0).with_growth(10.0),
            Instrument::new("B", "Energy", 10.0).with_pe(12.0).with_growth(0.0),
        ]);
        let err = PegSelector::default().select(&u).unwrap_err();
        assert!(matches!(err, SelectionError::NoUsableInstruments { universe_size: 2 }));
        assert!(err.to_string().contains("P/E > 0"));
    }

    #[test]
    fn test_round_one_picks_lowest_peg_per_sector() {
        let u = universe(vec![
            inst("E1", "Energy", 30.0, 10.0, 12.0), // PEG 3.0
            inst("E2", "Energy", 20.0, 10.0, 14.0), // PEG 2.0
            inst("F1", "Financials", 40.0, 10.0, 16.0), // PEG 4.0
        ]);
        let result = selector(20, 1, 1.0).select(&u).unwrap();
        assert_eq!(result.tickers(), vec!["E2", "F1"]);
        assert_eq!(result.rationale.sector_picks[0].sector_size, 2);
        assert!(result.rationale.round_two_additions.is_empty());
    }

    #[test]
    fn test_round_one_tie_broken_by_rank_then_ticker() {
        let u = universe(vec![
            inst("B", "Energy", 10.0, 10.0, 10.0),
            inst("A", "Energy", 10.0, 10.0, 10.0),
            inst("C", "Energy", 10.0, 10.0, 10.0).with_rank(3),
        ]);
        let result = selector(1, 1, 0.5).select(&u).unwrap();
        assert_eq!(result.tickers(), vec!["C"]);

        let u = universe(vec![
            inst("B", "Energy", 10.0, 10.0, 10.0),
            inst("A", "Energy", 10.0, 10.0, 10.0),
        ]);
        let result = selector(1, 1, 0.5).select(&u).unwrap();
        assert_eq!(result.tickers(), vec!["A"]);
    }

    #[test]
    fn test_round_two_threshold_is_strict_and_sorted() {
        let u = universe(vec![
            inst("E1", "Energy", 5.0, 20.0, 20.0),  // 0.25, round 1
            inst("E2", "Energy", 18.0, 20.0, 20.0), // 0.9
            inst("E3", "Energy", 20.0, 20.0, 20.0), // 1.0, excluded
            inst("E4", "Energy", 10.0, 20.0, 20.0), // 0.5
        ]);
        let result = selector(20, 1, 1.0).select(&u).unwrap();
        assert_eq!(result.tickers(), vec!["E1", "E4", "E2"]);

        let pegs: Vec<f64> = result
            .rationale
            .round_two_additions
            .iter()
            .map(|a| a.peg_ratio)
            .collect();
        assert_eq!(pegs, vec![0.5, 0.9]);
    }

    #[test]
    fn test_round_two_capped_by_max_count() {
        let u = universe(vec![
            inst("E1", "Energy", 2.0, 20.0, 20.0),
            inst("E2", "Energy", 4.0, 20.0, 20.0),
            inst("E3", "Energy", 6.0, 20.0, 20.0),
            inst("E4", "Energy", 8.0, 20.0, 20.0),
        ]);
        let result = selector(3, 1, 1.0).select(&u).unwrap();
        assert_eq!(result.tickers(), vec!["E1", "E2", "E3"]);
    }

    #[test]
    fn test_zero_remaining_slots_skip_round_two() {
        let u = universe(vec![
            inst("A1", "A", 5.0, 20.0, 20.0),
            inst("A2", "A", 6.0, 20.0, 20.0),
            inst("B1", "B", 5.0, 20.0, 20.0),
            inst("C1", "C", 5.0, 20.0, 20.0),
        ]);
        let result = selector(2, 1, 1.0).select(&u).unwrap();
        // Round 1 alone exceeds max_count and is kept whole
        assert_eq!(result.tickers(), vec!["A1", "B1", "C1"]);
        assert!(result.rationale.round_two_additions.is_empty());
        assert_eq!(result.rationale.notes.len(), 1);
    }

    #[test]
    fn test_achieved_rate_and_feasibility() {
        let u = universe(vec![
            inst("A", "Energy", 10.0, 20.0, 18.0),
            inst("B", "Financials", 10.0, 20.0, 14.0),
        ]);
        let result = selector(20, 2, 1.0).select(&u).unwrap();
        assert_relative_eq!(result.achieved_growth_rate, 0.16, epsilon = 1e-12);
        assert!(result.feasible);
        assert_eq!(result.rationale.achieved_rate, "16.0%");
        assert!(result.rationale.feasibility_note.is_none());

        // same rate, too few instruments
        let result = selector(20, 3, 1.0).select(&u).unwrap();
        assert!(!result.feasible);
        let note = result.rationale.feasibility_note.unwrap();
        assert!(note.contains("Best achievable: 16.0%"));
        assert!(note.contains("3 required"));
    }

    #[rstest]
    #[case(30, ForecastHorizon::TwentyFourMonths)]
    #[case(42, ForecastHorizon::ThirtySixMonths)]
    #[case(60, ForecastHorizon::SixtyMonths)]
    fn test_horizon_resolution(#[case] months: u32, #[case] expected: ForecastHorizon) {
        let u = universe(vec![inst("A", "Energy", 10.0, 20.0, 18.0)]);
        let result = PegSelector::with_config(SelectionConfig {
            horizon_months: months,
            ..Default::default()
        })
        .select(&u)
        .unwrap();
        assert_eq!(result.rationale.forecast_horizon, expected);
    }

    #[test]
    fn test_missing_forecasts_excluded_from_rate() {
        let u = universe(vec![
            inst("A", "Energy", 10.0, 20.0, 18.0),
            Instrument::new("B", "Financials", 50.0).with_pe(10.0).with_growth(20.0),
        ]);
        let result = selector(20, 1, 1.0).select(&u).unwrap();
        assert_eq!(result.len(), 2);
        assert_relative_eq!(result.achieved_growth_rate, 0.18, epsilon = 1e-12);
        assert_eq!(result.rationale.instruments_without_forecast, 1);
    }
}
