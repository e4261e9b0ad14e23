//! Tag operations.
//!
//! A tag may be attached to any taggable entity. The target is stored as a
//! `(kind, id)` pair rather than a foreign key, so one table serves every
//! entity type; attachment therefore validates the target itself before
//! writing.

use marketrow_core::{CollectionId, CustomerId, EntityKind, EntityRef, OrderId, ProductId, TagId};

use crate::error::{AppError, Result};
use crate::models::{Tag, TaggedItem};
use crate::store::{Store, StoreError, StoreTx};

/// List all tags, or only those attached to one entity.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn list_tags(store: &dyn Store, entity: Option<EntityRef>) -> Result<Vec<Tag>> {
    let mut tx = store.begin().await?;
    let tags = match entity {
        Some(entity) => tx.tags_for_entity(entity).await?,
        None => tx.list_tags().await?,
    };
    tx.commit().await?;
    Ok(tags)
}

/// Create a tag.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] if the label is blank.
pub async fn create_tag(store: &dyn Store, label: &str) -> Result<Tag> {
    let label = label.trim();
    if label.is_empty() {
        return Err(AppError::InvalidInput("tag label must not be empty".to_owned()));
    }
    let mut tx = store.begin().await?;
    let tag = tx.insert_tag(label).await?;
    tx.commit().await?;
    Ok(tag)
}

/// Attach a tag to an entity.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the tag does not exist,
/// [`AppError::InvalidInput`] if the target entity does not, or a conflict
/// if the tag is already attached to it.
pub async fn attach(store: &dyn Store, tag_id: TagId, entity: EntityRef) -> Result<TaggedItem> {
    let mut tx = store.begin().await?;
    if tx.get_tag(tag_id).await?.is_none() {
        return Err(AppError::NotFound("tag"));
    }
    if !entity_exists(tx.as_mut(), entity).await? {
        return Err(AppError::InvalidInput(format!("unknown {}", entity.kind)));
    }
    let item = tx.attach_tag(tag_id, entity).await?;
    tx.commit().await?;
    Ok(item)
}

/// Detach a tag from an entity.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if no such attachment exists.
pub async fn detach(store: &dyn Store, tag_id: TagId, entity: EntityRef) -> Result<()> {
    let mut tx = store.begin().await?;
    if !tx.detach_tag(tag_id, entity).await? {
        return Err(AppError::NotFound("tag attachment"));
    }
    tx.commit().await?;
    Ok(())
}

/// List everything a tag is attached to.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the tag does not exist.
pub async fn tagged_items(store: &dyn Store, tag_id: TagId) -> Result<Vec<TaggedItem>> {
    let mut tx = store.begin().await?;
    if tx.get_tag(tag_id).await?.is_none() {
        return Err(AppError::NotFound("tag"));
    }
    let items = tx.tagged_items(tag_id).await?;
    tx.commit().await?;
    Ok(items)
}

async fn entity_exists(
    tx: &mut dyn StoreTx,
    entity: EntityRef,
) -> std::result::Result<bool, StoreError> {
    Ok(match entity.kind {
        EntityKind::Product => tx.get_product(ProductId::new(entity.id)).await?.is_some(),
        EntityKind::Collection => tx
            .get_collection(CollectionId::new(entity.id))
            .await?
            .is_some(),
        EntityKind::Customer => tx.get_customer(CustomerId::new(entity.id)).await?.is_some(),
        EntityKind::Order => tx.get_order(OrderId::new(entity.id)).await?.is_some(),
    })
}
