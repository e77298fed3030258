//! Items: the posts and replies that the feed ranks.
//!
//! An item's `created_at` is assigned at insert and never changes. Its
//! counters are denormalised caches: `like_count` tracks the number of
//! [`Like`](crate::like::Like) records for the item, `reply_count` tracks the
//! number of active replies belonging to a post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Whether an item is a top-level post or a reply inside a post's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
  Post,
  Reply,
}

/// Moderation status. Supplied by the moderation collaborator and treated as
/// an opaque filter: only [`ContentStatus::Active`] items are ranked.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
  #[default]
  Active,
  Locked,
  Removed,
}

impl ContentStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

/// A named engagement counter on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
  Likes,
  Replies,
}

// ─── Item ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:         Uuid,
  pub kind:            ItemKind,
  pub author_id:       Uuid,
  /// The post a reply belongs to. `None` for posts.
  pub post_id:         Option<Uuid>,
  /// The reply this reply answers, if it is nested.
  pub parent_reply_id: Option<Uuid>,
  pub body:            String,
  pub status:          ContentStatus,
  /// Server-assigned; non-decreasing in insert order.
  pub created_at:      DateTime<Utc>,
  pub like_count:      u64,
  /// Always zero for replies.
  pub reply_count:     u64,
}

impl Item {
  pub fn is_post(&self) -> bool { self.kind == ItemKind::Post }

  pub fn counter(&self, field: CounterField) -> u64 {
    match field {
      CounterField::Likes => self.like_count,
      CounterField::Replies => self.reply_count,
    }
  }
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EngagementStore::add_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id:  Uuid,
  pub body:       String,
  /// Requested creation time; defaults to now. The store raises it to the
  /// latest existing `created_at` so insert order stays monotonic.
  pub created_at: Option<DateTime<Utc>>,
}

impl NewPost {
  pub fn new(author_id: Uuid, body: impl Into<String>) -> Self {
    Self { author_id, body: body.into(), created_at: None }
  }

  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }
}

/// Input to [`crate::store::EngagementStore::add_reply`].
#[derive(Debug, Clone)]
pub struct NewReply {
  pub post_id:         Uuid,
  pub parent_reply_id: Option<Uuid>,
  pub author_id:       Uuid,
  pub body:            String,
  pub created_at:      Option<DateTime<Utc>>,
}

impl NewReply {
  pub fn new(post_id: Uuid, author_id: Uuid, body: impl Into<String>) -> Self {
    Self {
      post_id,
      parent_reply_id: None,
      author_id,
      body: body.into(),
      created_at: None,
    }
  }

  pub fn under(mut self, parent_reply_id: Uuid) -> Self {
    self.parent_reply_id = Some(parent_reply_id);
    self
  }

  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }
}
