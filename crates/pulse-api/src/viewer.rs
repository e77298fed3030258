//! Extractors for the acting user.
//!
//! Authentication happens in front of this service; by the time a request
//! arrives the authenticated user's id is in the `x-user-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated user. Rejects with 401 when the header is absent or
/// not a UUID.
pub struct Viewer(pub Uuid);

/// The user, if any. A present but malformed header is still rejected.
pub struct MaybeViewer(pub Option<Uuid>);

fn read_user(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = parts.headers.get(USER_HEADER) else {
    return Ok(None);
  };
  let text = value.to_str().map_err(|_| ApiError::Unauthorized)?;
  Uuid::parse_str(text.trim())
    .map(Some)
    .map_err(|_| ApiError::Unauthorized)
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    read_user(parts)?.map(Viewer).ok_or(ApiError::Unauthorized)
  }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeViewer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeViewer(read_user(parts)?))
  }
}
