//! Handler for `GET /feed`.
//!
//! Query parameters: `mode` (`latest` | `trending`, default `latest`),
//! `limit` (1..=100, default 20) and `cursor` (latest mode only).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pulse_core::{
  engine::Engine,
  feed::{DEFAULT_LIMIT, FeedMode, FeedPage, FeedRequest},
  store::EngagementStore,
};
use serde::Deserialize;

use crate::{error::ApiError, viewer::MaybeViewer};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  #[serde(default)]
  pub mode:   FeedMode,
  pub limit:  Option<usize>,
  pub cursor: Option<String>,
}

impl From<FeedParams> for FeedRequest {
  fn from(params: FeedParams) -> Self {
    FeedRequest {
      mode:   params.mode,
      limit:  params.limit.unwrap_or(DEFAULT_LIMIT),
      cursor: params.cursor.filter(|c| !c.is_empty()),
    }
  }
}

/// `GET /feed[?mode=...][&limit=...][&cursor=...]`
pub async fn handler<S>(
  State(engine): State<Arc<Engine<S>>>,
  MaybeViewer(viewer): MaybeViewer,
  Query(params): Query<FeedParams>,
) -> Result<Json<FeedPage>, ApiError>
where
  S: EngagementStore,
{
  let request = FeedRequest::from(params);
  let page = engine.feed(viewer, &request).await?;
  Ok(Json(page))
}
