//! JSON HTTP API for pulse.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`pulse_core::store::EngagementStore`]. Authentication happens upstream;
//! the acting user arrives in the `x-user-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pulse_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod feed;
pub mod items;
pub mod likes;
pub mod viewer;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use pulse_core::{engine::Engine, store::EngagementStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: EngagementStore + 'static,
{
  Router::new()
    // Feed
    .route("/feed", get(feed::handler::<S>))
    // Likes
    .route("/likes/{item_id}", post(likes::like::<S>).delete(likes::unlike::<S>))
    // Items
    .route("/items/{item_id}", get(items::get_one::<S>))
    .route("/items/{item_id}/status", put(items::set_status::<S>))
    .route("/posts", post(items::create_post::<S>))
    .route(
      "/posts/{post_id}/replies",
      get(items::list_replies::<S>).post(items::create_reply::<S>),
    )
    .with_state(engine)
}
