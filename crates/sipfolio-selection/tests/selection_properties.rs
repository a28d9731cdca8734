//! Invariant checks over randomly generated universes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sipfolio_data::{ForecastHorizon, Instrument, InstrumentUniverse};
use sipfolio_selection::{PegSelector, SelectionConfig, SelectionError};
use std::collections::HashSet;

const SECTORS: [&str; 6] = [
    "Energy",
    "Financials",
    "Health Care",
    "Information Technology",
    "Materials",
    "Utilities",
];

fn random_universe(rng: &mut StdRng, size: usize) -> InstrumentUniverse {
    let instruments = (0..size)
        .map(|i| {
            let sector = SECTORS[rng.gen_range(0..SECTORS.len())];
            let mut inst = Instrument::new(format!("T{i:03}"), sector, rng.gen_range(5.0..5000.0))
                .with_forecast(ForecastHorizon::TwentyFourMonths, rng.gen_range(5.0..30.0));
            // roughly one in five fails the quality gate
            if rng.gen_bool(0.9) {
                inst = inst.with_pe(rng.gen_range(-10.0..60.0));
            }
            if rng.gen_bool(0.9) {
                inst = inst.with_growth(rng.gen_range(-5.0..40.0));
            }
            if rng.gen_bool(0.5) {
                inst = inst.with_rank(rng.gen_range(1..200));
            }
            inst
        })
        .collect();
    InstrumentUniverse::new(instruments).unwrap()
}

fn check_invariants(universe: &InstrumentUniverse, config: &SelectionConfig) {
    let result = match PegSelector::with_config(config.clone()).select(universe) {
        Ok(result) => result,
        Err(SelectionError::NoUsableInstruments { .. }) => {
            assert_eq!(universe.usable().count(), 0);
            return;
        }
        Err(e) => panic!("unexpected error: {e}"),
    };

    // no duplicates
    let tickers: HashSet<&str> = result.tickers().into_iter().collect();
    assert_eq!(tickers.len(), result.len());

    // quality gate
    for inst in &result.selected {
        assert!(inst.is_usable(), "{} should have been gated out", inst.ticker);
    }

    // one Round-1 pick per usable sector, holding that sector's minimum PEG
    let usable_sectors: HashSet<&str> = universe.usable().map(|i| i.sector.as_str()).collect();
    assert_eq!(result.rationale.sector_picks.len(), usable_sectors.len());
    for pick in &result.rationale.sector_picks {
        let min_peg = universe
            .usable()
            .filter(|i| i.sector == pick.sector)
            .filter_map(Instrument::peg_ratio)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(pick.peg_ratio, min_peg);
        assert!(tickers.contains(pick.ticker.as_str()));
    }

    // Round 2 respects the threshold, ordering and cap
    let additions = &result.rationale.round_two_additions;
    assert!(additions.iter().all(|a| a.peg_ratio < config.peg_threshold));
    assert!(additions.windows(2).all(|w| w[0].peg_ratio <= w[1].peg_ratio));
    if !additions.is_empty() {
        assert!(result.len() <= config.max_count);
    }

    assert_eq!(
        result.feasible,
        result.achieved_growth_rate >= config.target_growth_rate && result.len() >= config.min_count
    );
}

#[test]
fn test_invariants_hold_over_random_universes() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let size = rng.gen_range(1..80);
        let universe = random_universe(&mut rng, size);
        let config = SelectionConfig {
            max_count: rng.gen_range(1..25),
            min_count: rng.gen_range(1..10),
            peg_threshold: rng.gen_range(0.2..3.0),
            ..Default::default()
        };
        check_invariants(&universe, &config);
    }
}

#[test]
fn test_selection_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let universe = random_universe(&mut rng, 60);
    let selector = PegSelector::default();

    let first = selector.select(&universe).unwrap();
    let second = selector.select(&universe).unwrap();
    assert_eq!(first, second);
}
