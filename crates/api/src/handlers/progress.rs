//! Handlers for per-user progress on a section.

use axum::extract::{Path, State};
use axum::Json;
use pagetree_core::progress::STATUS_COMPLETE;
use pagetree_core::types::DbId;
use pagetree_db::models::page_visit::{PageVisitRow, SetPageStatus};
use pagetree_db::models::user_visit::UserVisitRow;
use pagetree_db::repositories::{PageVisitRepo, UserVisitRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::{load_tree_of_section, require_section};
use crate::middleware::user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PageStatus {
    pub section_id: DbId,
    /// `None` until a status is first recorded.
    pub status: Option<String>,
    /// Whether the section before this one in reading order is complete.
    pub unlocked: bool,
}

/// POST /api/v1/sections/{id}/visit
pub async fn record_visit(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: CurrentUser,
) -> AppResult<Json<DataResponse<UserVisitRow>>> {
    require_section(&state, id).await?;
    let visit = UserVisitRepo::record(&state.pool, user.user_id, id).await?;
    Ok(Json(DataResponse { data: visit }))
}

/// PUT /api/v1/sections/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: CurrentUser,
    Json(input): Json<SetPageStatus>,
) -> AppResult<Json<DataResponse<PageVisitRow>>> {
    if input.status.trim().is_empty() {
        return Err(AppError::BadRequest("Status must not be empty".into()));
    }
    require_section(&state, id).await?;
    let page = PageVisitRepo::set_status(&state.pool, user.user_id, id, &input.status).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/sections/{id}/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: CurrentUser,
) -> AppResult<Json<DataResponse<PageStatus>>> {
    let tree = load_tree_of_section(&state, id).await?;
    let status = PageVisitRepo::find(&state.pool, user.user_id, id)
        .await?
        .map(|p| p.status);

    let unlocked = match tree.previous(id) {
        None => true,
        Some(previous) => PageVisitRepo::find(&state.pool, user.user_id, previous.id)
            .await?
            .is_some_and(|p| p.status == STATUS_COMPLETE),
    };

    Ok(Json(DataResponse {
        data: PageStatus {
            section_id: id,
            status,
            unlocked,
        },
    }))
}
