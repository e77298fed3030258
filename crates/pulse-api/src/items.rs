//! Handlers for item lookup, intake and moderation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/items/{id}` | Item with the caller's like flag |
//! | `PUT`  | `/items/{id}/status` | Body: `{"status":"active"\|"locked"\|"removed"}` |
//! | `POST` | `/posts` | Body: [`NewPostBody`]; returns 201 |
//! | `GET`  | `/posts/{id}/replies` | Active replies as a tree, oldest first |
//! | `POST` | `/posts/{id}/replies` | Body: [`NewReplyBody`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use pulse_core::{
  engine::Engine,
  feed::ItemSummary,
  item::{ContentStatus, Item, NewPost, NewReply},
  store::EngagementStore,
  thread::ReplyNode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  viewer::{MaybeViewer, Viewer},
};

// ─── Lookup ───────────────────────────────────────────────────────────────────

/// `GET /items/{id}`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  MaybeViewer(viewer): MaybeViewer,
  Path(id): Path<Uuid>,
) -> Result<Json<ItemSummary>, ApiError>
where
  S: EngagementStore,
{
  Ok(Json(engine.item(viewer, id).await?))
}

/// `GET /posts/{id}/replies`
pub async fn list_replies<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<ReplyNode>>, ApiError>
where
  S: EngagementStore,
{
  Ok(Json(engine.replies(post_id).await?))
}

// ─── Moderation ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: ContentStatus,
}

/// `PUT /items/{id}/status`
pub async fn set_status<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(moderator): Viewer,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Item>, ApiError>
where
  S: EngagementStore,
{
  tracing::info!(%moderator, item_id = %id, status = ?body.status, "moderation request");
  Ok(Json(engine.set_status(id, body.status).await?))
}

// ─── Intake ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewPostBody {
  pub body: String,
}

/// `POST /posts`
pub async fn create_post<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(author): Viewer,
  Json(body): Json<NewPostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
{
  let item = engine.create_post(NewPost::new(author, body.body)).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct NewReplyBody {
  pub body:            String,
  /// Reply being answered, when nested.
  pub parent_reply_id: Option<Uuid>,
}

/// `POST /posts/{id}/replies`
pub async fn create_reply<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(author): Viewer,
  Path(post_id): Path<Uuid>,
  Json(body): Json<NewReplyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
{
  let mut input = NewReply::new(post_id, author, body.body);
  if let Some(parent) = body.parent_reply_id {
    input = input.under(parent);
  }
  let item = engine.create_reply(input).await?;
  Ok((StatusCode::CREATED, Json(item)))
}
