#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/sipfolio/sipfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod instrument;
pub mod loader;
pub mod summary;
pub mod universe;

pub use error::{DataError, Result};
pub use instrument::{ForecastHorizon, Instrument};
pub use loader::{load_universe_csv, read_universe};
pub use summary::{MarketSummary, SectorSummary};
pub use universe::InstrumentUniverse;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
