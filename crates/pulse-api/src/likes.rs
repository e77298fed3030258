//! Handlers for `/likes/{item_id}`.
//!
//! | Method   | Path               | Response                         |
//! |----------|--------------------|----------------------------------|
//! | `POST`   | `/likes/{item_id}` | `{"liked": true, "created": _}`  |
//! | `DELETE` | `/likes/{item_id}` | `{"liked": false, "deleted": _}` |
//!
//! Both require the `x-user-id` header.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use pulse_core::{
  engine::Engine,
  like::{LikeOutcome, UnlikeOutcome},
  store::EngagementStore,
};
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

/// `POST /likes/{item_id}`
pub async fn like<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(user): Viewer,
  Path(item_id): Path<Uuid>,
) -> Result<Json<LikeOutcome>, ApiError>
where
  S: EngagementStore,
{
  Ok(Json(engine.like(user, item_id).await?))
}

/// `DELETE /likes/{item_id}`
pub async fn unlike<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(user): Viewer,
  Path(item_id): Path<Uuid>,
) -> Result<Json<UnlikeOutcome>, ApiError>
where
  S: EngagementStore,
{
  Ok(Json(engine.unlike(user, item_id).await?))
}
