//! Handlers for the `/sections` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pagetree_core::block::ContentBlock;
use pagetree_core::block_type::BlockContext;
use pagetree_core::exchange::SectionDict;
use pagetree_core::hierarchy::Hierarchy;
use pagetree_core::section::{Section, SectionUpdate};
use pagetree_core::types::DbId;
use pagetree_db::models::section::SectionRow;
use pagetree_db::repositories::SectionRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::{load_tree_of_section, not_found};
use crate::middleware::user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A section as it appears in navigation: enough to link to it.
#[derive(Debug, Serialize)]
pub struct SectionLink {
    pub id: DbId,
    pub label: String,
    pub slug: String,
    pub path: String,
    pub is_module: bool,
}

impl SectionLink {
    pub fn new(tree: &Hierarchy, section: &Section) -> Self {
        Self {
            id: section.id,
            label: section.label.clone(),
            slug: section.slug.clone(),
            path: tree.path(section.id).unwrap_or_default(),
            is_module: section.is_module,
        }
    }
}

/// One block with everything a page needs to display it.
#[derive(Debug, Serialize)]
pub struct BlockView {
    pub block: ContentBlock,
    pub title: String,
    pub rendered: String,
    pub summary: String,
    pub js: String,
    pub css: String,
    pub edit_label: String,
}

/// The page view of one section.
#[derive(Debug, Serialize)]
pub struct SectionView {
    pub section: Section,
    pub path: String,
    pub absolute_url: String,
    pub blocks: Vec<BlockView>,
    pub children: Vec<SectionLink>,
    pub previous: Option<SectionLink>,
    pub next: Option<SectionLink>,
    pub module: Option<SectionLink>,
}

/// Body of `POST /sections/{id}/move`.
#[derive(Debug, Deserialize)]
pub struct MoveSection {
    pub parent_id: DbId,
}

/// Body of the reorder endpoints: every current id, in the new order.
#[derive(Debug, Deserialize)]
pub struct Reorder {
    pub ids: Vec<DbId>,
}

/// GET /api/v1/sections/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: Option<CurrentUser>,
) -> AppResult<Json<DataResponse<SectionView>>> {
    let tree = load_tree_of_section(&state, id).await?;
    let section = tree.section(id).ok_or_else(|| not_found("section", id))?;
    let ctx = user.map(|u| u.block_context()).unwrap_or_default();

    let view = build_view(&tree, section, &state, &ctx)?;
    Ok(Json(DataResponse { data: view }))
}

fn build_view(
    tree: &Hierarchy,
    section: &Section,
    state: &AppState,
    ctx: &BlockContext,
) -> AppResult<SectionView> {
    let registry = &state.block_types;
    let blocks = tree
        .blocks_of(section.id)
        .into_iter()
        .map(|block| -> AppResult<BlockView> {
            Ok(BlockView {
                title: block.title(&section.label),
                rendered: block.render(registry, ctx)?,
                summary: block.render_summary(registry, ctx)?,
                js: block.render_js(registry)?,
                css: block.render_css(registry)?,
                edit_label: block.edit_label(registry)?,
                block: block.clone(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let link = |s: &Section| SectionLink::new(tree, s);
    Ok(SectionView {
        section: section.clone(),
        path: tree.path(section.id).unwrap_or_default(),
        absolute_url: tree.absolute_url(section.id).unwrap_or_default(),
        blocks,
        children: tree.children(section.id).into_iter().map(link).collect(),
        previous: tree.previous(section.id).map(link),
        next: tree.next(section.id).map(link),
        module: tree.module_of(section.id).map(link),
    })
}

/// PUT /api/v1/sections/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SectionUpdate>,
) -> AppResult<Json<DataResponse<SectionRow>>> {
    let section = SectionRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("section", id))?;
    Ok(Json(DataResponse { data: section }))
}

/// DELETE /api/v1/sections/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if SectionRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("section", id))
    }
}

/// GET /api/v1/sections/{id}/export
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SectionDict>>> {
    let dict = SectionRepo::subtree_as_dict(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("section", id))?;
    Ok(Json(DataResponse { data: dict }))
}

/// POST /api/v1/sections/{id}/children
pub async fn add_child(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SectionDict>,
) -> AppResult<(StatusCode, Json<DataResponse<SectionRow>>)> {
    let section = SectionRepo::add_child(&state.pool, id, &input, &state.block_types).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: section })))
}

/// POST /api/v1/sections/{id}/reorder-children
pub async fn reorder_children(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<Reorder>,
) -> AppResult<Json<DataResponse<Vec<SectionRow>>>> {
    SectionRepo::reorder_children(&state.pool, id, &input.ids).await?;
    let children = SectionRepo::list_children(&state.pool, id).await?;
    Ok(Json(DataResponse { data: children }))
}

/// POST /api/v1/sections/{id}/move
pub async fn move_section(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveSection>,
) -> AppResult<Json<DataResponse<SectionRow>>> {
    let section = SectionRepo::move_section(&state.pool, id, input.parent_id).await?;
    Ok(Json(DataResponse { data: section }))
}
