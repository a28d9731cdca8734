#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/sipfolio/sipfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod rationale;
pub mod selector;

pub use config::SelectionConfig;
pub use error::SelectionError;
pub use rationale::{RoundTwoAddition, SectorPick, SelectionRationale};
pub use selector::{PegSelector, SelectionResult};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
