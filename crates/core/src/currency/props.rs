//! Property-based tests for conversion, rounding and pivot resolution.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockledger_shared::types::CurrencyCode;

use super::allocation::reconcile_to_total;
use super::conversion::{convert_amount, round_amount};
use super::resolver::{RateLookupMethod, RateResolver};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate unrounded extensions (up to 6 decimal places).
fn exact_amounts() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((1i64..1_000_000_000i64).prop_map(|v| Decimal::new(v, 6)), 1..40)
}

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converted amounts never carry more than 2 decimal places.
    #[test]
    fn prop_convert_rounds_to_currency_precision(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = convert_amount(amount, rate).unwrap();
        prop_assert_eq!(result, result.round_dp(2));
        prop_assert!((result - amount * rate).abs() <= Decimal::new(5, 3));
    }

    /// Rounding is symmetric around zero.
    #[test]
    fn prop_rounding_is_symmetric(amount in positive_amount(), rate in positive_rate()) {
        let exact = amount * rate;
        prop_assert_eq!(round_amount(-exact), -round_amount(exact));
    }

    /// Reconciled lines always add up to the rounded total and each line
    /// moves at most one cent away from its own rounded value.
    #[test]
    fn prop_reconciled_lines_sum_to_total(exact in exact_amounts()) {
        let mut rounded: Vec<Decimal> = exact.iter().map(|e| round_amount(*e)).collect();
        let before = rounded.clone();
        let total = reconcile_to_total(&exact, &mut rounded);

        prop_assert_eq!(rounded.iter().copied().sum::<Decimal>(), total);
        prop_assert_eq!(total, round_amount(exact.iter().copied().sum()));
        for (after, original) in rounded.iter().zip(before.iter()) {
            prop_assert!((*after - *original).abs() <= Decimal::new(1, 2));
        }
    }

    /// Cross rates through the pivot are the ratio of the two pivot legs,
    /// and the reverse direction is the inverse ratio.
    #[test]
    fn prop_pivot_cross_rates_are_ratios(a in positive_rate(), b in positive_rate()) {
        let resolver = RateResolver::new(code("TRY"));
        let lookup = |from: &CurrencyCode, to: &CurrencyCode, _d: NaiveDate| {
            match (from.as_str(), to.as_str()) {
                ("USD", "TRY") => Some(a),
                ("EUR", "TRY") => Some(b),
                _ => None,
            }
        };

        let forward = resolver.resolve(&code("USD"), &code("EUR"), day(), lookup).unwrap();
        let backward = resolver.resolve(&code("EUR"), &code("USD"), day(), lookup).unwrap();

        prop_assert_eq!(forward.method, RateLookupMethod::ViaPivot);
        prop_assert_eq!(forward.rate, a / b);
        prop_assert_eq!(backward.rate, b / a);
    }

    /// A direct stored rate always takes precedence over the pivot.
    #[test]
    fn prop_direct_rate_takes_precedence(direct in positive_rate(), leg in positive_rate()) {
        let resolver = RateResolver::new(code("TRY"));
        let lookup = |from: &CurrencyCode, to: &CurrencyCode, _d: NaiveDate| {
            match (from.as_str(), to.as_str()) {
                ("USD", "EUR") => Some(direct),
                (_, "TRY") => Some(leg),
                _ => None,
            }
        };

        let resolved = resolver.resolve(&code("USD"), &code("EUR"), day(), lookup).unwrap();
        prop_assert_eq!(resolved.rate, direct);
        prop_assert_eq!(resolved.method, RateLookupMethod::Direct);
    }
}
