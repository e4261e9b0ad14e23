//! Status enums for orders and customers.
//!
//! Both enums persist as single-letter codes (`P`/`C`/`F`, `B`/`S`/`G`) and
//! serialize to JSON as lowercase words.

use serde::{Deserialize, Serialize};

/// Error returned when a persisted status code cannot be interpreted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized {kind} code: {code}")]
pub struct StatusParseError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub code: String,
}

/// Payment status of an order.
///
/// Every order starts `Pending`; an external payment collaborator later moves
/// it to `Complete` or `Failed`. This is the only mutation an order permits
/// after placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Complete,
    Failed,
}

impl PaymentStatus {
    /// The single-letter code stored in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Complete => "C",
            Self::Failed => "F",
        }
    }

    /// Parse a stored single-letter code.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for anything other than `P`, `C`, or `F`.
    pub fn from_code(code: &str) -> Result<Self, StatusParseError> {
        match code {
            "P" => Ok(Self::Pending),
            "C" => Ok(Self::Complete),
            "F" => Ok(Self::Failed),
            other => Err(StatusParseError {
                kind: "payment status",
                code: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            other => Err(StatusParseError {
                kind: "payment status",
                code: other.to_owned(),
            }),
        }
    }
}

/// Customer membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl Membership {
    /// The single-letter code stored in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bronze => "B",
            Self::Silver => "S",
            Self::Gold => "G",
        }
    }

    /// Parse a stored single-letter code.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for anything other than `B`, `S`, or `G`.
    pub fn from_code(code: &str) -> Result<Self, StatusParseError> {
        match code {
            "B" => Ok(Self::Bronze),
            "S" => Ok(Self::Silver),
            "G" => Ok(Self::Gold),
            other => Err(StatusParseError {
                kind: "membership",
                code: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

impl std::str::FromStr for Membership {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            other => Err(StatusParseError {
                kind: "membership",
                code: other.to_owned(),
            }),
        }
    }
}

// SQLx support (with postgres feature): both enums persist as TEXT codes.

#[cfg(feature = "postgres")]
macro_rules! impl_code_sqlx {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let code = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self::from_code(&code)?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_code_sqlx!(PaymentStatus);
#[cfg(feature = "postgres")]
impl_code_sqlx!(Membership);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_codes_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Complete,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::from_code(status.code()).unwrap(), status);
        }
    }

    #[test]
    fn payment_status_rejects_unknown_code() {
        let err = PaymentStatus::from_code("X").unwrap_err();
        assert_eq!(err.code, "X");
    }

    #[test]
    fn payment_status_defaults_to_pending() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn payment_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Complete).unwrap(),
            "\"complete\""
        );
        let parsed: PaymentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Failed);
    }

    #[test]
    fn membership_codes_roundtrip() {
        for tier in [Membership::Bronze, Membership::Silver, Membership::Gold] {
            assert_eq!(Membership::from_code(tier.code()).unwrap(), tier);
        }
    }

    #[test]
    fn membership_defaults_to_bronze() {
        assert_eq!(Membership::default(), Membership::Bronze);
    }

    #[test]
    fn display_matches_from_str() {
        let status: PaymentStatus = "pending".parse().unwrap();
        assert_eq!(status.to_string(), "pending");
        let tier: Membership = "gold".parse().unwrap();
        assert_eq!(tier.to_string(), "gold");
    }
}
