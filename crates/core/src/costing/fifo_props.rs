//! Property-based tests for the FIFO queue.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockledger_shared::types::{ProductId, WarehouseId};

use super::error::CostingError;
use super::fifo::FifoQueue;
use super::types::{InboundKind, SourceRef, StockKey};

#[derive(Debug, Clone)]
enum Movement {
    /// Receive quantity (4 dp) at unit cost (6 dp), `offset` minutes after t0.
    In { quantity: Decimal, cost: Decimal, offset: i64 },
    /// Issue quantity (4 dp).
    Out { quantity: Decimal },
}

fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..500_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn unit_cost() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|v| Decimal::new(v, 6))
}

fn movement() -> impl Strategy<Value = Movement> {
    prop_oneof![
        (quantity(), unit_cost(), 0i64..1_000)
            .prop_map(|(quantity, cost, offset)| Movement::In { quantity, cost, offset }),
        quantity().prop_map(|quantity| Movement::Out { quantity }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any sequence of movements: layers stay within bounds, consumed
    /// quantity matches allocations, nothing is allocated twice and a failed
    /// issue leaves the queue untouched.
    #[test]
    fn prop_fifo_invariants_hold(movements in prop::collection::vec(movement(), 1..40)) {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut queue = FifoQueue::new(StockKey::new(ProductId::new(), WarehouseId::new()));
        let mut received = Decimal::ZERO;

        for (n, movement) in movements.into_iter().enumerate() {
            match movement {
                Movement::In { quantity, cost, offset } => {
                    queue
                        .receive(
                            SourceRef::new("GRN", n.to_string()),
                            InboundKind::PurchaseReceipt,
                            t0 + Duration::minutes(offset),
                            quantity,
                            cost,
                        )
                        .unwrap();
                    received += quantity;
                }
                Movement::Out { quantity } => {
                    let before = queue.on_hand();
                    match queue.consume(&SourceRef::new("DO", n.to_string()), quantity, t0) {
                        Ok(result) => {
                            prop_assert_eq!(result.quantity(), quantity);
                            let line_sum: Decimal =
                                result.allocations.iter().map(|a| a.amount).sum();
                            prop_assert_eq!(line_sum, result.total_amount_base);
                            prop_assert_eq!(queue.on_hand(), before - quantity);
                        }
                        Err(CostingError::InsufficientStock { missing, .. }) => {
                            prop_assert!(quantity > before);
                            prop_assert_eq!(missing, quantity - before);
                            prop_assert_eq!(queue.on_hand(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other}"),
                    }
                }
            }

            prop_assert!(queue.is_consistent());
            let allocated: Decimal = queue.allocations().iter().map(|a| a.quantity).sum();
            prop_assert!(allocated <= received);
            prop_assert_eq!(queue.on_hand(), received - allocated);
        }
    }

    /// Draws are taken in arrival order: every allocation of one issue comes
    /// from a layer no later than the next one.
    #[test]
    fn prop_draws_follow_arrival_order(
        receipts in prop::collection::vec((quantity(), unit_cost(), 0i64..1_000), 1..20),
        issue in quantity(),
    ) {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut queue = FifoQueue::new(StockKey::new(ProductId::new(), WarehouseId::new()));
        for (n, (quantity, cost, offset)) in receipts.into_iter().enumerate() {
            queue
                .receive(
                    SourceRef::new("GRN", n.to_string()),
                    InboundKind::PurchaseReceipt,
                    t0 + Duration::minutes(offset),
                    quantity,
                    cost,
                )
                .unwrap();
        }

        if let Ok(result) = queue.consume(&SourceRef::new("DO", "1"), issue, t0) {
            let positions: Vec<usize> = result
                .allocations
                .iter()
                .filter_map(|a| queue.layers().iter().position(|l| l.id == a.layer_id))
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            // Every layer before the last one drawn is now exhausted.
            if let Some(&last) = positions.last() {
                prop_assert!(queue.layers()[..last].iter().all(|l| l.is_exhausted()));
            }
        }
    }
}
