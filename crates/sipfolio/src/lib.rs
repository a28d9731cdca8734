#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/sipfolio/sipfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod plan;
pub mod present;
pub mod projection;

// Re-export main types from sub-crates
pub use sipfolio_allocation as allocation;
pub use sipfolio_data as data;
pub use sipfolio_output as output;
pub use sipfolio_selection as selection;

pub use config::{PlanConfig, PlanRequest, RequestLimits};
pub use error::{ErrorCategory, PlanError};
pub use plan::{
    Diversification, InvestmentSummary, MODEL_VERSION, PlanEngine, PlanResult, PortfolioStats,
};
pub use projection::{Projection, ProjectionPoint, ProjectionSummary, project};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
