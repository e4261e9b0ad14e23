//! Tagged entity references for polymorphic associations.
//!
//! Tags can attach to several entity types. Rather than an open-ended
//! reflective lookup, the supported kinds form a closed enum and a tagged
//! reference is the pair `(kind, id)`. Adding a new taggable entity means
//! adding a variant here, which the compiler then walks through every match.

use serde::{Deserialize, Serialize};

use crate::types::id::{CollectionId, CustomerId, OrderId, ProductId};

/// Error returned when an entity-kind label cannot be interpreted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized entity kind: {0}")]
pub struct EntityKindError(pub String);

/// The closed set of entity types a tag may attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Collection,
    Customer,
    Order,
}

impl EntityKind {
    /// The label stored in the database and used in JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Collection => "collection",
            Self::Customer => "customer",
            Self::Order => "order",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = EntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "collection" => Ok(Self::Collection),
            "customer" => Ok(Self::Customer),
            "order" => Ok(Self::Order),
            other => Err(EntityKindError(other.to_owned())),
        }
    }
}

/// A reference to one entity of one of the supported kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Which entity table the id points into.
    pub kind: EntityKind,
    /// The entity's id within that table.
    pub id: i64,
}

impl EntityRef {
    /// Build a reference from a kind and raw id.
    #[must_use]
    pub const fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Reference a product.
    #[must_use]
    pub const fn product(id: ProductId) -> Self {
        Self::new(EntityKind::Product, id.as_i64())
    }

    /// Reference a collection.
    #[must_use]
    pub const fn collection(id: CollectionId) -> Self {
        Self::new(EntityKind::Collection, id.as_i64())
    }

    /// Reference a customer.
    #[must_use]
    pub const fn customer(id: CustomerId) -> Self {
        Self::new(EntityKind::Customer, id.as_i64())
    }

    /// Reference an order.
    #[must_use]
    pub const fn order(id: OrderId) -> Self {
        Self::new(EntityKind::Order, id.as_i64())
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

// SQLx support (with postgres feature): kinds persist as TEXT labels.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for EntityKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for EntityKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let label = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(label.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for EntityKind {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
