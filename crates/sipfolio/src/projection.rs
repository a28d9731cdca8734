//! SIP value projection.
//!
//! A fixed contribution is invested every month and grows at
//! `monthly_rate = annual_rate / 12` (simple division, not a geometric
//! conversion). The value after `m` contributions is the annuity closed form:
//!
//! ```text
//! FV(m) = P * ((1 + r)^m - 1) / r        (r ≠ 0)
//! FV(m) = P * m                          (r = 0)
//! ```
//!
//! Each month is computed from the closed form at full precision; only the
//! reported monetary values are rounded to whole currency units.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};

/// One month of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Month number, starting at 1.
    pub month: u32,
    /// `monthly_amount * month`.
    pub cumulative_invested: f64,
    /// Projected portfolio value, whole units.
    pub projected_value: f64,
    /// `projected_value - cumulative_invested`.
    pub gain: f64,
}

/// Scalar summary of the final month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    /// Value at the horizon.
    pub final_value: f64,
    /// Total contributed.
    pub total_investment: f64,
    /// `final_value - total_investment`.
    pub total_gain: f64,
    /// `final_value / total_investment`.
    pub money_multiplier: f64,
    /// `total_gain / horizon_months`.
    pub monthly_avg_gain: f64,
    /// `100 * total_gain / total_investment`.
    pub total_return_percentage: f64,
}

/// Month-by-month value trajectory of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Monthly contribution.
    pub monthly_amount: f64,
    /// Horizon in months.
    pub horizon_months: u32,
    /// Annual growth rate (decimal).
    pub annual_growth_rate: f64,
    /// `annual_growth_rate / 12`.
    pub monthly_rate: f64,
    /// One point per month.
    pub points: Vec<ProjectionPoint>,
    /// Final-month summary.
    pub summary: ProjectionSummary,
}

impl Projection {
    /// Months `1..=horizon`.
    pub fn months(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.month).collect()
    }

    /// Cumulative amount invested per month.
    pub fn cumulative_invested(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cumulative_invested).collect()
    }

    /// Projected value per month.
    pub fn projected_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.projected_value).collect()
    }

    /// Gain per month.
    pub fn monthly_gains(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.gain).collect()
    }
}

/// Unrounded value after `months` contributions of `monthly_amount` at `monthly_rate`.
///
/// `(1 + r)^m - 1` is evaluated as `expm1(m * ln1p(r))`, which stays accurate
/// when `r` is so small that `1 + r` rounds to 1. `monthly_rate` must exceed -1.
pub fn future_value(monthly_amount: f64, months: u32, monthly_rate: f64) -> f64 {
    if monthly_rate == 0.0 {
        monthly_amount * f64::from(months)
    } else {
        let growth_minus_one = (f64::from(months) * monthly_rate.ln_1p()).exp_m1();
        monthly_amount * (growth_minus_one / monthly_rate)
    }
}

/// Round to whole currency units, ties to even.
fn to_currency(value: f64) -> f64 {
    value.round_ties_even()
}

/// Project the value of a plan contributing `monthly_amount` for `horizon_months`.
///
/// # Errors
/// Returns [`PlanError::InvalidParameters`] for a zero horizon, a negative or
/// non-finite amount, a non-finite rate, or an annual rate at or below -1200%.
pub fn project(
    monthly_amount: f64,
    horizon_months: u32,
    annual_growth_rate: f64,
) -> Result<Projection, PlanError> {
    if horizon_months == 0 {
        return Err(PlanError::InvalidParameters(
            "horizon must be at least one month".to_string(),
        ));
    }
    if !monthly_amount.is_finite() || monthly_amount < 0.0 {
        return Err(PlanError::InvalidParameters(format!(
            "monthly amount must be a non-negative number, got {monthly_amount}"
        )));
    }
    if !annual_growth_rate.is_finite() {
        return Err(PlanError::InvalidParameters(format!(
            "growth rate must be finite, got {annual_growth_rate}"
        )));
    }

    let monthly_rate = annual_growth_rate / 12.0;
    if monthly_rate <= -1.0 {
        return Err(PlanError::InvalidParameters(format!(
            "monthly rate {monthly_rate} would wipe out the portfolio"
        )));
    }

    let points: Vec<ProjectionPoint> = (1..=horizon_months)
        .map(|month| {
            let cumulative_invested = to_currency(monthly_amount * f64::from(month));
            let projected_value = to_currency(future_value(monthly_amount, month, monthly_rate));
            ProjectionPoint {
                month,
                cumulative_invested,
                projected_value,
                gain: projected_value - cumulative_invested,
            }
        })
        .collect();

    let last = points.last().copied().ok_or_else(|| {
        PlanError::InvalidParameters("horizon must be at least one month".to_string())
    })?;
    let total_investment = last.cumulative_invested;
    let final_value = last.projected_value;
    let total_gain = last.gain;
    let (money_multiplier, total_return_percentage) = if total_investment > 0.0 {
        (
            final_value / total_investment,
            100.0 * total_gain / total_investment,
        )
    } else {
        (1.0, 0.0)
    };

    Ok(Projection {
        monthly_amount,
        horizon_months,
        annual_growth_rate,
        monthly_rate,
        points,
        summary: ProjectionSummary {
            final_value,
            total_investment,
            total_gain,
            money_multiplier,
            monthly_avg_gain: total_gain / f64::from(horizon_months),
            total_return_percentage,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_twelve_months_at_twelve_percent() {
        let projection = project(50_000.0, 12, 0.12).unwrap();
        let s = projection.summary;

        assert_relative_eq!(projection.monthly_rate, 0.01);
        assert_relative_eq!(s.total_investment, 600_000.0);
        // 50000 * (1.01^12 - 1) / 0.01 = 634125.15
        assert_relative_eq!(s.final_value, 634_125.0);
        assert_relative_eq!(s.total_gain, 34_125.0);
        assert_relative_eq!(s.money_multiplier, 634_125.0 / 600_000.0);
        assert_relative_eq!(s.monthly_avg_gain, 34_125.0 / 12.0);
        assert_relative_eq!(s.total_return_percentage, 5.6875, epsilon = 1e-9);

        // the first contribution has not grown yet
        assert_relative_eq!(projection.points[0].projected_value, 50_000.0);
        assert_relative_eq!(projection.points[1].projected_value, 100_500.0);
    }

    #[test]
    fn test_zero_rate_tracks_contributions() {
        let projection = project(25_000.0, 36, 0.0).unwrap();
        for point in &projection.points {
            assert_eq!(point.projected_value, point.cumulative_invested);
            assert_eq!(point.gain, 0.0);
        }
        assert_relative_eq!(projection.summary.money_multiplier, 1.0);
    }

    #[test]
    fn test_cumulative_invested_independent_of_rate() {
        let a = project(10_000.0, 24, 0.08).unwrap();
        let b = project(10_000.0, 24, 0.45).unwrap();
        assert_eq!(a.cumulative_invested(), b.cumulative_invested());
        assert_eq!(a.cumulative_invested()[23], 240_000.0);
    }

    #[test]
    fn test_monotone_in_rate() {
        let rates = [-0.2, -0.05, 0.0, 0.01, 0.08, 0.12, 0.25, 0.5];
        let projections: Vec<Projection> = rates
            .iter()
            .map(|&r| project(50_000.0, 60, r).unwrap())
            .collect();
        for pair in projections.windows(2) {
            for (lo, hi) in pair[0].points.iter().zip(&pair[1].points) {
                assert!(lo.projected_value <= hi.projected_value);
            }
        }
    }

    #[test]
    fn test_tiny_rates_stay_on_contributions() {
        // 1 + r rounds to 1 for the smallest of these
        let rates = [0.0, 1e-17, 1e-16, 1e-13, 1e-10, 1e-6, 1e-3, 0.01, 0.12];
        let finals: Vec<f64> = rates
            .iter()
            .map(|&r| project(50_000.0, 12, r).unwrap().summary.final_value)
            .collect();

        for (rate, value) in rates.iter().zip(&finals).take(6) {
            assert_eq!(*value, 600_000.0, "rate {rate}");
        }
        for pair in finals.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[rstest]
    #[case(1e-17)]
    #[case(-1e-17)]
    #[case(1e-12)]
    fn test_future_value_near_zero_rate(#[case] monthly_rate: f64) {
        assert_relative_eq!(
            future_value(50_000.0, 12, monthly_rate),
            600_000.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_parallel_sequences_have_horizon_length() {
        let projection = project(1_000.0, 18, 0.1).unwrap();
        assert_eq!(projection.months(), (1..=18).collect::<Vec<_>>());
        assert_eq!(projection.projected_values().len(), 18);
        assert_eq!(projection.monthly_gains().len(), 18);
    }

    #[test]
    fn test_zero_amount_is_well_defined() {
        let projection = project(0.0, 12, 0.12).unwrap();
        assert_eq!(projection.summary.final_value, 0.0);
        assert_relative_eq!(projection.summary.money_multiplier, 1.0);
        assert!(projection.summary.total_return_percentage.is_finite());
    }

    #[rstest]
    #[case(50_000.0, 0, 0.12)]
    #[case(-1.0, 12, 0.12)]
    #[case(f64::INFINITY, 12, 0.12)]
    #[case(50_000.0, 12, f64::NAN)]
    #[case(50_000.0, 12, -12.0)]
    fn test_invalid_inputs(#[case] amount: f64, #[case] months: u32, #[case] rate: f64) {
        let err = project(amount, months, rate).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETERS");
    }
}
