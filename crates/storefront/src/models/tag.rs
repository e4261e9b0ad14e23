//! Tag types.
//!
//! Tags attach to entities of several kinds through [`TaggedItem`], which
//! carries an explicit `(entity_kind, entity_id)` pair rather than a foreign
//! key into any one table.

use marketrow_core::{EntityKind, EntityRef, TagId, TaggedItemId};

/// A reusable label.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub label: String,
}

/// One attachment of a tag to an entity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaggedItem {
    pub id: TaggedItemId,
    pub tag_id: TagId,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
}

impl TaggedItem {
    /// The tagged entity as a typed reference.
    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_kind, self.entity_id)
    }
}
