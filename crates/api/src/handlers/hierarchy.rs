//! Handlers for the `/hierarchies` resource.
//!
//! Hierarchies are addressed by their unique name.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pagetree_core::exchange::HierarchyDict;
use pagetree_db::models::hierarchy::HierarchyRow;
use pagetree_db::repositories::{HierarchyRepo, UserVisitRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::load_tree_by_name;
use crate::handlers::section::SectionLink;
use crate::middleware::user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub path: String,
}

/// GET /api/v1/hierarchies
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<HierarchyRow>>>> {
    let hierarchies = HierarchyRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: hierarchies }))
}

/// POST /api/v1/hierarchies
///
/// Creates a hierarchy from the nested exchange format. An empty
/// `sections` list creates a hierarchy holding only its root.
pub async fn import(
    State(state): State<AppState>,
    Json(input): Json<HierarchyDict>,
) -> AppResult<(StatusCode, Json<DataResponse<HierarchyRow>>)> {
    let hierarchy = HierarchyRepo::import(&state.pool, &input, &state.block_types).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: hierarchy })))
}

/// GET /api/v1/hierarchies/{name}
pub async fn export(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<HierarchyDict>>> {
    let dict = HierarchyRepo::export(&state.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Hierarchy '{name}' not found")))?;
    Ok(Json(DataResponse { data: dict }))
}

/// DELETE /api/v1/hierarchies/{name}
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    let hierarchy = HierarchyRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Hierarchy '{name}' not found")))?;
    HierarchyRepo::delete(&state.pool, hierarchy.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/hierarchies/{name}/resolve?path=
pub async fn resolve(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ResolveParams>,
) -> AppResult<Json<DataResponse<SectionLink>>> {
    let tree = load_tree_by_name(&state, &name).await?;
    let section = tree
        .find_section_from_path(&params.path)
        .ok_or_else(|| AppError::NotFound(format!("No section at path '{}'", params.path)))?;
    Ok(Json(DataResponse {
        data: SectionLink::new(&tree, section),
    }))
}

/// GET /api/v1/hierarchies/{name}/location
///
/// The section the user visited most recently, or the root.
pub async fn location(
    State(state): State<AppState>,
    Path(name): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<DataResponse<SectionLink>>> {
    let tree = load_tree_by_name(&state, &name).await?;
    let visit = UserVisitRepo::latest_in_hierarchy(&state.pool, user.user_id, tree.id()).await?;
    let section = visit
        .and_then(|v| tree.section(v.section_id))
        .unwrap_or_else(|| tree.root());
    Ok(Json(DataResponse {
        data: SectionLink::new(&tree, section),
    }))
}
