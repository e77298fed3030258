//! Error types for `pulse-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::cursor::CursorError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("item {0} is not a post")]
  NotAPost(Uuid),

  #[error("replies are disabled for post {0}")]
  RepliesDisabled(Uuid),

  #[error("parent reply {parent} does not belong to post {post}")]
  ParentMismatch { parent: Uuid, post: Uuid },

  #[error("invalid cursor: {0}")]
  InvalidCursor(#[from] CursorError),

  #[error("limit must be between 1 and {max}, got {got}")]
  InvalidLimit { got: usize, max: usize },

  /// An opaque failure inside the storage backend.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for errors caused by the request rather than by the server.
  pub fn is_client_error(&self) -> bool { !matches!(self, Self::Store(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
