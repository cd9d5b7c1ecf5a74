//! Strongly-typed ID newtypes for domain entities.
//!
//! Wrapping `Uuid` per entity keeps a `StudentFeeId` from being passed where
//! a `PaymentIntentId` is expected. The newtypes are `#[sqlx(transparent)]`,
//! so they bind and decode exactly like the underlying UUID column.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
        )]
        #[sqlx(transparent)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the inner UUID value.
            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// ID of a fee structure template.
    FeeStructureId
);

define_id!(
    /// ID of a single component within a fee structure.
    FeeComponentId
);

define_id!(
    /// ID of a per-student fee obligation.
    StudentFeeId
);

define_id!(
    /// ID of an installment row under a student fee.
    InstallmentId
);

define_id!(
    /// ID of an approved concession.
    ConcessionId
);

define_id!(
    /// ID of an imposed fine.
    FineId
);

define_id!(
    /// ID of a payment intent.
    PaymentIntentId
);

define_id!(
    /// ID of a settled fee payment.
    FeePaymentId
);

define_id!(
    /// ID of a student record owned by the enrollment service.
    StudentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_random_ids() {
        assert_ne!(StudentFeeId::new(), StudentFeeId::new());
    }

    #[test]
    fn uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = PaymentIntentId::from(uuid);
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn parse_and_display() {
        let id: StudentFeeId = "12345678-1234-1234-1234-123456789abc".parse().unwrap();
        assert_eq!(id.to_string(), "12345678-1234-1234-1234-123456789abc");
        assert!("not-a-uuid".parse::<StudentFeeId>().is_err());
    }

    #[test]
    fn serializes_as_plain_uuid_string() {
        let id: FeePaymentId = "12345678-1234-1234-1234-123456789abc".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""12345678-1234-1234-1234-123456789abc""#);
        let back: FeePaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn debug_carries_type_name() {
        let id: FineId = "12345678-1234-1234-1234-123456789abc".parse().unwrap();
        assert!(format!("{:?}", id).starts_with("FineId("));
    }
}
