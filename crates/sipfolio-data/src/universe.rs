//! Instrument universe snapshot.
//!
//! The universe is built once per request and never mutated afterwards, so
//! concurrent computations can share a reference to it freely.

use crate::error::{DataError, Result};
use crate::instrument::Instrument;
use std::collections::HashMap;

/// Read-only collection of instruments with ticker lookup and sector grouping.
#[derive(Debug, Clone, Default)]
pub struct InstrumentUniverse {
    instruments: Vec<Instrument>,
    ticker_index: HashMap<String, usize>,
}

impl InstrumentUniverse {
    /// Build a universe from instrument records.
    ///
    /// # Errors
    /// Returns [`DataError::DuplicateTicker`] if a ticker repeats and
    /// [`DataError::InvalidPrice`] if any price is not a positive finite number.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        let mut ticker_index = HashMap::with_capacity(instruments.len());

        for (i, inst) in instruments.iter().enumerate() {
            if !(inst.current_price.is_finite() && inst.current_price > 0.0) {
                return Err(DataError::InvalidPrice {
                    ticker: inst.ticker.clone(),
                    price: inst.current_price,
                });
            }
            if ticker_index.insert(inst.ticker.clone(), i).is_some() {
                return Err(DataError::DuplicateTicker(inst.ticker.clone()));
            }
        }

        Ok(Self {
            instruments,
            ticker_index,
        })
    }

    /// An empty universe.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All instruments, in the order they were supplied.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the universe holds no instruments.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Look up an instrument by ticker.
    pub fn get(&self, ticker: &str) -> Option<&Instrument> {
        self.ticker_index.get(ticker).map(|&i| &self.instruments[i])
    }

    /// Check if a ticker is in the universe.
    pub fn contains(&self, ticker: &str) -> bool {
        self.ticker_index.contains_key(ticker)
    }

    /// All tickers.
    pub fn tickers(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.ticker.clone()).collect()
    }

    /// Distinct sectors in order of first appearance.
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for inst in &self.instruments {
            if !seen.contains(&inst.sector.as_str()) {
                seen.push(inst.sector.as_str());
            }
        }
        seen
    }

    /// All instruments in a sector.
    pub fn instruments_in_sector(&self, sector: &str) -> Vec<&Instrument> {
        self.instruments
            .iter()
            .filter(|i| i.sector == sector)
            .collect()
    }

    /// Count of instruments per sector.
    pub fn sector_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for inst in &self.instruments {
            *counts.entry(inst.sector.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Instruments that pass the quality gate (positive P/E and growth).
    pub fn usable(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter().filter(|i| i.is_usable())
    }

    /// Look up several tickers at once, preserving the requested order.
    ///
    /// Unknown tickers are skipped.
    pub fn subset<S: AsRef<str>>(&self, tickers: &[S]) -> Vec<&Instrument> {
        tickers.iter().filter_map(|t| self.get(t.as_ref())).collect()
    }
}
