//! Request extractors.
//!
//! - [`user::CurrentUser`] -- The caller's opaque user id from `X-User-Id`.

pub mod user;
