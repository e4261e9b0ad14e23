//! Collection route handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use marketrow_core::CollectionId;

use crate::error::Result;
use crate::models::{Collection, NewCollection};
use crate::services::catalog;
use crate::state::AppState;

/// Collection as rendered to clients.
#[derive(Debug, Serialize)]
pub struct CollectionView {
    pub id: CollectionId,
    pub title: String,
}

impl From<Collection> for CollectionView {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id,
            title: collection.title,
        }
    }
}

/// List all collections.
///
/// GET /collections
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CollectionView>>> {
    let collections = catalog::list_collections(state.store()).await?;
    Ok(Json(
        collections.into_iter().map(CollectionView::from).collect(),
    ))
}

/// Collection detail.
///
/// GET /collections/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<Json<CollectionView>> {
    let collection = catalog::get_collection(state.store(), id).await?;
    Ok(Json(collection.into()))
}

/// Create a collection.
///
/// POST /collections
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewCollection>,
) -> Result<(StatusCode, Json<CollectionView>)> {
    let collection = catalog::create_collection(state.store(), &new).await?;
    Ok((StatusCode::CREATED, Json(collection.into())))
}

/// Rename a collection.
///
/// PUT /collections/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Json(new): Json<NewCollection>,
) -> Result<Json<CollectionView>> {
    let collection = catalog::update_collection(state.store(), id, &new).await?;
    Ok(Json(collection.into()))
}

/// Delete a collection unless products still reference it.
///
/// DELETE /collections/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<StatusCode> {
    catalog::delete_collection(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
