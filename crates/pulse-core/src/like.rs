//! Like records and the outcomes of counter mutations.
//!
//! A [`Like`] is the source of truth; `Item::like_count` is a cache of how
//! many exist. At most one like exists per `(user_id, item_id)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
  pub like_id:    Uuid,
  pub user_id:    Uuid,
  pub item_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

// ─── Insertion ───────────────────────────────────────────────────────────────

/// A like record was written and the item's counter incremented with it.
#[derive(Debug, Clone)]
pub struct Created {
  pub like:       Like,
  /// The item's `like_count` after the increment.
  pub like_count: u64,
}

/// The `(user_id, item_id)` pair was already liked; nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyExists;

/// Result of attempting to insert a like under the uniqueness constraint.
pub type LikeInsertion = Result<Created, AlreadyExists>;

// ─── Counter adjustments ─────────────────────────────────────────────────────

/// Outcome of a relative counter delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
  /// The delta was applied; carries the new counter value.
  Applied(u64),
  /// A decrement would have driven the counter below zero and was dropped.
  Clamped,
}

// ─── Operation outcomes ──────────────────────────────────────────────────────

/// Returned by [`crate::engine::Engine::like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
  pub liked:   bool,
  /// `false` when the user had already liked the item.
  pub created: bool,
}

/// Returned by [`crate::engine::Engine::unlike`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlikeOutcome {
  pub liked:   bool,
  /// `false` when there was no like to remove.
  pub deleted: bool,
}
