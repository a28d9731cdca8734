#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/sipfolio/sipfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod allocation;
pub mod error;
pub mod optimizer;
pub mod reconcile;
pub mod risk;

pub use allocation::{Allocation, ShareAllocation};
pub use error::AllocationError;
pub use optimizer::{
    OptimizationMethod, OptimizationOutcome, OptimizedPortfolio, OptimizerConfig, WeightOptimizer,
};
pub use reconcile::{reconcile, total_share_cost};
pub use risk::DiagonalRiskModel;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
