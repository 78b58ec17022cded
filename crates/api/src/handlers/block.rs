//! Handlers for content blocks.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pagetree_core::exchange::BlockDict;
use pagetree_core::types::{DbId, Payload};
use pagetree_db::models::page_block::PageBlockRow;
use pagetree_db::repositories::PageBlockRepo;

use crate::error::AppResult;
use crate::handlers::not_found;
use crate::handlers::section::Reorder;
use crate::middleware::user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sections/{id}/blocks
pub async fn create(
    State(state): State<AppState>,
    Path(section_id): Path<DbId>,
    Json(input): Json<BlockDict>,
) -> AppResult<(StatusCode, Json<DataResponse<PageBlockRow>>)> {
    let block = PageBlockRepo::create(&state.pool, section_id, &input, &state.block_types).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: block })))
}

/// POST /api/v1/sections/{id}/reorder-blocks
pub async fn reorder(
    State(state): State<AppState>,
    Path(section_id): Path<DbId>,
    Json(input): Json<Reorder>,
) -> AppResult<Json<DataResponse<Vec<PageBlockRow>>>> {
    PageBlockRepo::reorder(&state.pool, section_id, &input.ids).await?;
    let blocks = PageBlockRepo::list_by_section(&state.pool, section_id).await?;
    Ok(Json(DataResponse { data: blocks }))
}

/// GET /api/v1/blocks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageBlockRow>>> {
    let block = PageBlockRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("block", id))?;
    Ok(Json(DataResponse { data: block }))
}

/// PUT /api/v1/blocks/{id}
///
/// The body is one flat object: `label`, `css_extra` and the block type's
/// own fields. Invalid submissions return per-field messages.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: Option<CurrentUser>,
    Json(values): Json<Payload>,
) -> AppResult<Json<DataResponse<PageBlockRow>>> {
    let ctx = user.map(|u| u.block_context()).unwrap_or_default();
    let block = PageBlockRepo::edit(&state.pool, id, &values, &state.block_types, &ctx)
        .await?
        .ok_or_else(|| not_found("block", id))?;
    Ok(Json(DataResponse { data: block }))
}

/// DELETE /api/v1/blocks/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    match PageBlockRepo::delete(&state.pool, id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found("block", id)),
    }
}
