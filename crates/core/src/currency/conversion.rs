//! Currency conversion and rounding rules.
//!
//! CRITICAL: Rounding strategy:
//! - Monetary amounts round half-up (away from zero) to 2 decimal places
//! - Quantities carry 4 decimal places so that many small allocations do
//!   not compound rounding error
//! - Rates and unit costs are never rounded; they keep the full `Decimal`
//!   precision and only the extended amount is rounded
//!
//! Products use checked arithmetic: `None` means the result does not fit in
//! a `Decimal`, and callers turn that into a typed error.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Decimal places of a base-currency amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places of an inventory quantity.
pub const QUANTITY_SCALE: u32 = 4;

/// Remaining quantities at or below this value count as fully satisfied.
pub const QUANTITY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Rounds a monetary amount half-up to [`AMOUNT_SCALE`] places.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a quantity half-up to [`QUANTITY_SCALE`] places.
#[must_use]
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount with a multiplicative rate and rounds to currency precision.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use stockledger_core::currency::convert_amount;
///
/// assert_eq!(convert_amount(dec!(100), dec!(1.5)), Some(dec!(150.00)));
/// ```
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount.checked_mul(rate).map(round_amount)
}

/// Extended amount of `quantity` units at `unit_cost`, rounded to currency precision.
#[must_use]
pub fn extend(quantity: Decimal, unit_cost: Decimal) -> Option<Decimal> {
    quantity.checked_mul(unit_cost).map(round_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_amount() {
        // 100 USD * 30 = 3000 TRY
        assert_eq!(convert_amount(dec!(100), dec!(30)), Some(dec!(3000.00)));
    }

    #[test]
    fn test_convert_amount_overflow() {
        assert_eq!(convert_amount(Decimal::MAX, dec!(2)), None);
    }

    #[rstest]
    #[case(dec!(2.345), dec!(2.35))]
    #[case(dec!(2.355), dec!(2.36))]
    #[case(dec!(2.344), dec!(2.34))]
    #[case(dec!(-2.345), dec!(-2.35))]
    fn test_round_amount_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[test]
    fn test_round_quantity_keeps_four_places() {
        assert_eq!(round_quantity(dec!(1.23456)), dec!(1.2346));
        assert_eq!(round_quantity(dec!(0.00004)), dec!(0.0000));
    }

    #[test]
    fn test_extend() {
        assert_eq!(extend(dec!(3), dec!(5.00)), Some(dec!(15.00)));
        assert_eq!(extend(dec!(0.3333), dec!(7.00)), Some(dec!(2.33)));
        // Unit cost keeps its full precision; only the extension rounds.
        assert_eq!(extend(dec!(10000), dec!(0.123456)), Some(dec!(1234.56)));
        assert_eq!(extend(dec!(1000000), dec!(0.00004)), Some(dec!(40.00)));
    }

    #[test]
    fn test_extend_overflow() {
        let quantity = Decimal::from(10_i64.pow(15));
        let unit_cost = Decimal::from(10_i64.pow(14));
        assert_eq!(extend(quantity, unit_cost), None);
    }

    #[test]
    fn test_quantity_epsilon() {
        assert_eq!(QUANTITY_EPSILON, dec!(0.000000001));
    }
}
