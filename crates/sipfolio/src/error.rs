//! Error taxonomy for plan construction.
//!
//! Every failure maps to one [`ErrorCategory`] with a stable machine code.
//! A degraded optimization is not an error; it is reported on the result.

use sipfolio_allocation::AllocationError;
use sipfolio_data::DataError;
use sipfolio_selection::SelectionError;
use std::fmt;
use thiserror::Error;

/// Machine-distinguishable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Empty universe, nothing passes the quality gate, or unreadable instrument data.
    DataInsufficiency,
    /// A request or configuration value is out of range.
    InvalidParameters,
    /// An internal numeric invariant was violated.
    PrecisionAnomaly,
}

impl ErrorCategory {
    /// Stable code for transports and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DataInsufficiency => "INSUFFICIENT_DATA",
            Self::InvalidParameters => "INVALID_PARAMETERS",
            Self::PrecisionAnomaly => "PRECISION_ANOMALY",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors produced while building a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Selection failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Weighting or reconciliation failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Instrument data could not be loaded.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Request parameter out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Internal numeric invariant violated.
    #[error("Precision anomaly: {0}")]
    PrecisionAnomaly(String),

    /// Configuration file could not be read.
    #[error("Configuration IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file is not valid JSON.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl PlanError {
    /// Category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Selection(SelectionError::InvalidParameter(_))
            | Self::Allocation(AllocationError::UnknownMethod(_))
            | Self::InvalidParameters(_)
            | Self::ConfigIo(_)
            | Self::ConfigParse(_) => ErrorCategory::InvalidParameters,
            Self::Selection(_)
            | Self::Data(_)
            | Self::Allocation(AllocationError::EmptySelection | AllocationError::NonPositivePrice { .. }) => {
                ErrorCategory::DataInsufficiency
            }
            Self::Allocation(AllocationError::DimensionMismatch { .. })
            | Self::PrecisionAnomaly(_) => ErrorCategory::PrecisionAnomaly,
        }
    }

    /// Stable machine code, shorthand for `self.category().code()`.
    pub const fn code(&self) -> &'static str {
        self.category().code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PlanError::Selection(SelectionError::EmptyUniverse), "INSUFFICIENT_DATA")]
    #[case(
        PlanError::Selection(SelectionError::NoUsableInstruments { universe_size: 3 }),
        "INSUFFICIENT_DATA"
    )]
    #[case(
        PlanError::Selection(SelectionError::InvalidParameter("x".into())),
        "INVALID_PARAMETERS"
    )]
    #[case(PlanError::InvalidParameters("horizon".into()), "INVALID_PARAMETERS")]
    #[case(PlanError::PrecisionAnomaly("sum".into()), "PRECISION_ANOMALY")]
    #[case(
        PlanError::Allocation(AllocationError::DimensionMismatch { expected: 2, actual: 3 }),
        "PRECISION_ANOMALY"
    )]
    #[case(
        PlanError::Allocation(AllocationError::UnknownMethod("foo".into())),
        "INVALID_PARAMETERS"
    )]
    fn test_error_codes(#[case] error: PlanError, #[case] code: &str) {
        assert_eq!(error.code(), code);
    }

    #[test]
    fn test_message_is_transparent() {
        let err = PlanError::from(SelectionError::NoUsableInstruments { universe_size: 4 });
        assert!(err.to_string().contains("quality gate"));
        assert_eq!(err.category(), ErrorCategory::DataInsufficiency);
    }
}
