//! Costing error types.

use rust_decimal::Decimal;
use stockledger_shared::types::{ProductId, WarehouseId};
use thiserror::Error;

/// Errors raised by FIFO layer creation and consumption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostingError {
    /// Quantity or unit cost is zero or negative.
    #[error("Invalid {field}: {value} (must be greater than zero)")]
    InvalidQuantity {
        /// Offending input field.
        field: &'static str,
        /// Rejected value.
        value: Decimal,
    },

    /// The layers cannot cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id} in warehouse {warehouse_id}: \
         requested {requested}, available {available}, missing {missing}"
    )]
    InsufficientStock {
        /// Product.
        product_id: ProductId,
        /// Warehouse.
        warehouse_id: WarehouseId,
        /// Requested quantity.
        requested: Decimal,
        /// Quantity the layers could supply.
        available: Decimal,
        /// Shortfall.
        missing: Decimal,
    },

    /// A cost extension or stock total does not fit in a `Decimal`.
    #[error("Stock value for product {product_id} in warehouse {warehouse_id} is out of range")]
    AmountOverflow {
        /// Product.
        product_id: ProductId,
        /// Warehouse.
        warehouse_id: WarehouseId,
    },

    /// The queue changed between planning and applying a consumption.
    #[error("Stock for product {product_id} in warehouse {warehouse_id} changed since planning")]
    StalePlan {
        /// Product.
        product_id: ProductId,
        /// Warehouse.
        warehouse_id: WarehouseId,
    },
}

impl CostingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            Self::StalePlan { .. } => "STALE_PLAN",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StalePlan { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_stock_names_shortfall() {
        let err = CostingError::InsufficientStock {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            requested: dec!(5),
            available: dec!(3),
            missing: dec!(2),
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
        assert!(err.to_string().contains("missing 2"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_quantity_display() {
        let err = CostingError::InvalidQuantity {
            field: "unit_cost_base",
            value: dec!(-1),
        };
        assert_eq!(
            err.to_string(),
            "Invalid unit_cost_base: -1 (must be greater than zero)"
        );
    }
}
