//! Whole-share reconciliation.
//!
//! Every instrument receives at least one share, however small its weight, so
//! small allocations are skewed upward and the realized monthly cost generally
//! differs from the requested amount.

use crate::allocation::{Allocation, ShareAllocation};
use crate::error::AllocationError;
use log::info;

/// Attach whole-share orders to `allocations` and recompute realized weights.
///
/// `target_shares = monthly_allocation / current_price`, rounded half-to-even
/// and floored at one share.
///
/// # Errors
/// Returns [`AllocationError::EmptySelection`] for empty input and
/// [`AllocationError::NonPositivePrice`] if any price is not a positive number.
pub fn reconcile(allocations: &[Allocation]) -> Result<Vec<Allocation>, AllocationError> {
    if allocations.is_empty() {
        return Err(AllocationError::EmptySelection);
    }

    let mut orders = Vec::with_capacity(allocations.len());
    for allocation in allocations {
        let price = allocation.current_price;
        if !(price.is_finite() && price > 0.0) {
            return Err(AllocationError::NonPositivePrice {
                ticker: allocation.ticker.clone(),
                price,
            });
        }

        let target_shares = allocation.monthly_allocation / price;
        let whole_shares = (target_shares.round_ties_even() as u64).max(1);
        let share_cost = whole_shares as f64 * price;
        orders.push((target_shares, whole_shares, share_cost));
    }

    let total_cost: f64 = orders.iter().map(|(_, _, cost)| cost).sum();

    let reconciled: Vec<Allocation> = allocations
        .iter()
        .zip(orders)
        .map(|(allocation, (target_shares, whole_shares, share_cost))| Allocation {
            shares: Some(ShareAllocation {
                target_shares,
                whole_shares,
                share_cost,
                actual_weight: share_cost / total_cost,
                total_monthly_investment: total_cost,
            }),
            ..allocation.clone()
        })
        .collect();

    info!(
        "Reconciled {} allocations, realized monthly cost {:.2}",
        reconciled.len(),
        total_cost
    );
    Ok(reconciled)
}

/// Realized monthly cost of reconciled allocations (zero if none are reconciled).
pub fn total_share_cost(allocations: &[Allocation]) -> f64 {
    allocations
        .iter()
        .filter_map(|a| a.shares.as_ref().map(|s| s.share_cost))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use sipfolio_data::Instrument;

    fn allocation(ticker: &str, price: f64, weight: f64, monthly: f64) -> Allocation {
        Allocation {
            weight,
            monthly_allocation: weight * monthly,
            ..Allocation::from_instrument(&Instrument::new(ticker, "Energy", price), 20.0, 0.25)
        }
    }

    #[test]
    fn test_reconcile_basic() {
        let allocations = vec![
            allocation("A", 100.0, 0.6, 10_000.0), // 60 shares
            allocation("B", 300.0, 0.4, 10_000.0), // 13.33 -> 13 shares
        ];
        let reconciled = reconcile(&allocations).unwrap();

        let a = reconciled[0].shares.as_ref().unwrap();
        assert_eq!(a.whole_shares, 60);
        assert_relative_eq!(a.share_cost, 6_000.0);

        let b = reconciled[1].shares.as_ref().unwrap();
        assert_relative_eq!(b.target_shares, 4_000.0 / 300.0, epsilon = 1e-12);
        assert_eq!(b.whole_shares, 13);
        assert_relative_eq!(b.share_cost, 3_900.0);

        assert_relative_eq!(a.total_monthly_investment, 9_900.0);
        assert_relative_eq!(b.total_monthly_investment, 9_900.0);
        assert_relative_eq!(a.actual_weight + b.actual_weight, 1.0, epsilon = 1e-12);
        assert_relative_eq!(total_share_cost(&reconciled), 9_900.0);

        // target weights are left untouched
        assert_relative_eq!(reconciled[0].weight, 0.6);
    }

    #[test]
    fn test_minimum_one_share() {
        let allocations = vec![
            allocation("CHEAP", 10.0, 0.99, 1_000.0),
            allocation("PRICEY", 5_000.0, 0.01, 1_000.0), // 0.002 shares
        ];
        let reconciled = reconcile(&allocations).unwrap();
        let pricey = reconciled[1].shares.as_ref().unwrap();
        assert_eq!(pricey.whole_shares, 1);
        assert!(pricey.actual_weight > 0.8);
    }

    #[rstest]
    #[case(250.0, 2)] // 2.5 rounds to even
    #[case(350.0, 4)] // 3.5 rounds to even
    #[case(260.0, 3)]
    fn test_half_to_even_rounding(#[case] monthly: f64, #[case] expected: u64) {
        let reconciled = reconcile(&[allocation("A", 100.0, 1.0, monthly)]).unwrap();
        assert_eq!(reconciled[0].shares.as_ref().unwrap().whole_shares, expected);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(reconcile(&[]), Err(AllocationError::EmptySelection)));

        let mut bad = allocation("A", 100.0, 1.0, 1_000.0);
        bad.current_price = 0.0;
        assert!(matches!(
            reconcile(&[bad]),
            Err(AllocationError::NonPositivePrice { .. })
        ));
    }
}
