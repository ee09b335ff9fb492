//! Remainder correction for sets of individually rounded amounts.
//!
//! When several exact amounts are rounded one by one, the sum of the
//! rounded values can drift from the rounded sum. This module pushes the
//! difference back onto individual lines, smallest currency unit at a time,
//! so the lines always add up exactly to the rounded total.
//!
//! Lines are chosen with the Largest Remainder Method:
//! 1. Compute the rounding loss of every line (exact - rounded)
//! 2. If the total is short, add one unit to the lines that lost the most
//! 3. If the total is over, remove one unit from the lines that gained the most

use rust_decimal::Decimal;

use super::conversion::{AMOUNT_SCALE, round_amount};

/// Adjusts `rounded` in place so that it sums to `round_amount(Σ exact)`.
///
/// `exact` and `rounded` must have the same length; `rounded[i]` is the
/// currency-rounded value of `exact[i]`. Returns the rounded total.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use stockledger_core::currency::reconcile_to_total;
///
/// // Three draws of 0.3333 units at 1.00 each round to 0.33 apiece,
/// // while the total 0.9999 rounds to 1.00.
/// let exact = vec![dec!(0.3333), dec!(0.3333), dec!(0.3333)];
/// let mut rounded = vec![dec!(0.33), dec!(0.33), dec!(0.33)];
/// let total = reconcile_to_total(&exact, &mut rounded);
/// assert_eq!(total, dec!(1.00));
/// assert_eq!(rounded.iter().sum::<rust_decimal::Decimal>(), dec!(1.00));
/// ```
pub fn reconcile_to_total(exact: &[Decimal], rounded: &mut [Decimal]) -> Decimal {
    debug_assert_eq!(exact.len(), rounded.len());

    let total = round_amount(exact.iter().copied().sum());
    if rounded.is_empty() {
        return total;
    }

    let unit = Decimal::new(1, AMOUNT_SCALE);
    let mut difference = total - rounded.iter().copied().sum::<Decimal>();
    if difference.is_zero() {
        return total;
    }

    let mut order: Vec<usize> = (0..rounded.len()).collect();
    if difference.is_sign_positive() {
        // Short: lines that were rounded down the most get a unit back.
        order.sort_by(|&a, &b| (exact[b] - rounded[b]).cmp(&(exact[a] - rounded[a])));
    } else {
        // Over: lines that were rounded up the most give a unit back.
        order.sort_by(|&a, &b| (rounded[b] - exact[b]).cmp(&(rounded[a] - exact[a])));
    }

    let step = if difference.is_sign_positive() { unit } else { -unit };
    let mut cursor = 0;
    while difference.abs() >= unit {
        let index = order[cursor % order.len()];
        rounded[index] += step;
        difference -= step;
        cursor += 1;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_adjustment_needed() {
        let exact = vec![dec!(15.00), dec!(14.00)];
        let mut rounded = vec![dec!(15.00), dec!(14.00)];
        let total = reconcile_to_total(&exact, &mut rounded);
        assert_eq!(total, dec!(29.00));
        assert_eq!(rounded, vec![dec!(15.00), dec!(14.00)]);
    }

    #[test]
    fn test_short_total_adds_unit_to_largest_loss() {
        let exact = vec![dec!(0.334), dec!(0.333), dec!(0.3339)];
        let mut rounded = vec![dec!(0.33), dec!(0.33), dec!(0.33)];
        let total = reconcile_to_total(&exact, &mut rounded);
        // 1.0009 rounds to 1.00; the first line lost the most (0.004)
        assert_eq!(total, dec!(1.00));
        assert_eq!(rounded, vec![dec!(0.34), dec!(0.33), dec!(0.33)]);
    }

    #[test]
    fn test_over_total_removes_unit_from_largest_gain() {
        let exact = vec![dec!(0.125), dec!(0.125), dec!(0.126)];
        let mut rounded = vec![dec!(0.13), dec!(0.13), dec!(0.13)];
        let total = reconcile_to_total(&exact, &mut rounded);
        // 0.376 rounds to 0.38; the first line gained 0.005, same as the second
        assert_eq!(total, dec!(0.38));
        assert_eq!(rounded.iter().copied().sum::<Decimal>(), dec!(0.38));
        assert_eq!(rounded[2], dec!(0.13));
    }

    #[test]
    fn test_empty() {
        let mut rounded: Vec<Decimal> = vec![];
        assert_eq!(reconcile_to_total(&[], &mut rounded), Decimal::ZERO);
    }
}
