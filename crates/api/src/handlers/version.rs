//! Handlers for section version snapshots.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pagetree_core::types::DbId;
use pagetree_db::models::section_version::{SaveVersion, SectionVersionRow};
use pagetree_db::repositories::SectionVersionRepo;

use crate::error::AppResult;
use crate::handlers::{not_found, require_section};
use crate::middleware::user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sections/{id}/versions
pub async fn list_by_section(
    State(state): State<AppState>,
    Path(section_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SectionVersionRow>>>> {
    require_section(&state, section_id).await?;
    let versions = SectionVersionRepo::list_by_section(&state.pool, section_id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/sections/{id}/versions
pub async fn save(
    State(state): State<AppState>,
    Path(section_id): Path<DbId>,
    user: CurrentUser,
    Json(input): Json<SaveVersion>,
) -> AppResult<(StatusCode, Json<DataResponse<SectionVersionRow>>)> {
    let version =
        SectionVersionRepo::save_version(&state.pool, section_id, user.user_id, &input.activity)
            .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// GET /api/v1/versions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SectionVersionRow>>> {
    let version = SectionVersionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("version", id))?;
    Ok(Json(DataResponse { data: version }))
}

/// GET /api/v1/versions/{id}/more-recent
pub async fn more_recent(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SectionVersionRow>>>> {
    let versions = SectionVersionRepo::more_recent(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("version", id))?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/versions/{id}/revert
///
/// Returns the version recording the revert.
pub async fn revert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: CurrentUser,
) -> AppResult<Json<DataResponse<SectionVersionRow>>> {
    let version =
        SectionVersionRepo::revert(&state.pool, id, user.user_id, &state.block_types).await?;
    Ok(Json(DataResponse { data: version }))
}
