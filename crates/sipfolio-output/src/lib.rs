#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/sipfolio/sipfolio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{
    ExportError, ExportFormat, Exporter, HoldingExport, PortfolioExport, ProjectionExport,
    ProjectionRow,
};
pub use report::{Report, ReportBuilder, ReportError};
pub use summary::PlanSummary;
