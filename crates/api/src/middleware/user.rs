//! Caller identity extractor.
//!
//! Identity is established outside this service; callers pass their opaque
//! integer user id in the `X-User-Id` header.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use pagetree_core::block_type::BlockContext;
use pagetree_core::types::UserId;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request is made.
///
/// Use as `CurrentUser` where a user is required (missing header is a 400)
/// and as `Option<CurrentUser>` where one is optional.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: UserId,
}

impl CurrentUser {
    pub fn block_context(&self) -> BlockContext {
        BlockContext {
            user_id: Some(self.user_id),
        }
    }
}

fn parse_user(parts: &Parts) -> Result<Option<CurrentUser>, AppError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<UserId>().ok())
        .ok_or_else(|| AppError::BadRequest("X-User-Id must be an integer".into()))?;
    Ok(Some(CurrentUser { user_id }))
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_user(parts)?.ok_or_else(|| AppError::BadRequest("Missing X-User-Id header".into()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        parse_user(parts)
    }
}
