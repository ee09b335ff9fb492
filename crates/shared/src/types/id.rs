//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ProductId` where a `WarehouseId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(ProductId, "Unique identifier for a stocked product.");
typed_id!(WarehouseId, "Unique identifier for a warehouse.");
typed_id!(LayerId, "Unique identifier for a FIFO cost layer.");
typed_id!(AllocationId, "Unique identifier for a cost allocation record.");
typed_id!(AccountId, "Unique identifier for a general ledger account.");
typed_id!(CounterpartyId, "Unique identifier for a counterparty (customer, vendor).");
typed_id!(JournalEntryId, "Unique identifier for a journal entry.");
typed_id!(JournalLineId, "Unique identifier for a journal line.");
typed_id!(ActorId, "Unique identifier for the user or system posting a document.");
typed_id!(FiscalPeriodId, "Unique identifier for a fiscal period.");
