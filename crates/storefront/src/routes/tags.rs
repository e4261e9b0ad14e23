//! Tag route handlers.
//!
//! Attachment targets are `(entity_kind, entity_id)` pairs; the same payload
//! shape is accepted as a JSON body on attach and as query parameters on
//! detach.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use marketrow_core::{EntityKind, EntityRef, TagId, TaggedItemId};

use crate::error::{AppError, Result};
use crate::models::{Tag, TaggedItem};
use crate::services::tags;
use crate::state::AppState;

/// Tag as rendered to clients.
#[derive(Debug, Serialize)]
pub struct TagView {
    pub id: TagId,
    pub label: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            label: tag.label,
        }
    }
}

/// One tag attachment.
#[derive(Debug, Serialize)]
pub struct TaggedItemView {
    pub id: TaggedItemId,
    pub tag_id: TagId,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
}

impl From<TaggedItem> for TaggedItemView {
    fn from(item: TaggedItem) -> Self {
        Self {
            id: item.id,
            tag_id: item.tag_id,
            entity_kind: item.entity_kind,
            entity_id: item.entity_id,
        }
    }
}

/// Request to create a tag.
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub label: String,
}

/// An attachment target, as JSON body or query parameters.
#[derive(Debug, Deserialize)]
pub struct EntityTarget {
    pub entity_kind: EntityKind,
    pub entity_id: i64,
}

impl EntityTarget {
    const fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_kind, self.entity_id)
    }
}

/// Query filter for the tag list.
#[derive(Debug, Deserialize)]
pub struct TagFilter {
    pub entity_kind: Option<EntityKind>,
    pub entity_id: Option<i64>,
}

impl TagFilter {
    fn entity_ref(&self) -> Result<Option<EntityRef>> {
        match (self.entity_kind, self.entity_id) {
            (Some(kind), Some(id)) => Ok(Some(EntityRef::new(kind, id))),
            (None, None) => Ok(None),
            _ => Err(AppError::InvalidInput(
                "entity_kind and entity_id must be provided together".to_owned(),
            )),
        }
    }
}

/// List tags, or only those attached to one entity.
///
/// GET /tags?entity_kind=&entity_id=
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<TagFilter>,
) -> Result<Json<Vec<TagView>>> {
    let entity = filter.entity_ref()?;
    let tags = tags::list_tags(state.store(), entity).await?;
    Ok(Json(tags.into_iter().map(TagView::from).collect()))
}

/// Create a tag.
///
/// POST /tags
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagView>)> {
    let tag = tags::create_tag(state.store(), &req.label).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

/// List everything a tag is attached to.
///
/// GET /tags/{id}/items
pub async fn items_index(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> Result<Json<Vec<TaggedItemView>>> {
    let items = tags::tagged_items(state.store(), id).await?;
    Ok(Json(items.into_iter().map(TaggedItemView::from).collect()))
}

/// Attach a tag to an entity.
///
/// POST /tags/{id}/items
pub async fn attach(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Json(target): Json<EntityTarget>,
) -> Result<(StatusCode, Json<TaggedItemView>)> {
    let item = tags::attach(state.store(), id, target.entity_ref()).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Detach a tag from an entity.
///
/// DELETE /tags/{id}/items?entity_kind=&entity_id=
pub async fn detach(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Query(target): Query<EntityTarget>,
) -> Result<StatusCode> {
    tags::detach(state.store(), id, target.entity_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
