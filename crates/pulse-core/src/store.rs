//! The `EngagementStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `pulse-store-sqlite`).
//! All durable state lives behind it, so correctness under concurrency rests
//! on the atomicity each method promises here.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  cursor::Cursor,
  feed::{FeedEntry, TrendingCandidate},
  item::{ContentStatus, CounterField, Item, NewPost, NewReply},
  like::{Adjustment, LikeInsertion},
};

/// Abstraction over the item, like and counter store.
///
/// Backend errors must convert into [`crate::Error`]; domain failures such as
/// a missing item should map onto the matching variant rather than
/// [`crate::Error::Store`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EngagementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Persist a new post with zeroed counters.
  fn add_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Persist a reply and increment its post's `reply_count` in the same
  /// transaction. Fails if the post is missing or not active, or if the
  /// parent reply belongs to another post.
  fn add_reply(
    &self,
    input: NewReply,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Retrieve an item by id. Returns `None` if not found.
  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Apply a moderation status. A reply crossing the active boundary adjusts
  /// its post's `reply_count` atomically with the status change.
  fn set_status(
    &self,
    id: Uuid,
    status: ContentStatus,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  // ── Counters ──────────────────────────────────────────────────────────

  /// Atomically add one to a counter.
  fn increment(
    &self,
    id: Uuid,
    field: CounterField,
  ) -> impl Future<Output = Result<Adjustment, Self::Error>> + Send + '_;

  /// Atomically subtract one from a counter, never going below zero.
  fn decrement(
    &self,
    id: Uuid,
    field: CounterField,
  ) -> impl Future<Output = Result<Adjustment, Self::Error>> + Send + '_;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// Insert a like under the `(user_id, item_id)` uniqueness constraint and
  /// increment `like_count`, as one transaction. A duplicate yields
  /// `Err(AlreadyExists)` inside `Ok` and leaves everything untouched.
  fn insert_like(
    &self,
    user_id: Uuid,
    item_id: Uuid,
  ) -> impl Future<Output = Result<LikeInsertion, Self::Error>> + Send + '_;

  /// Delete the like, if present, and decrement `like_count` in the same
  /// transaction. Returns whether a record was deleted.
  fn delete_like(
    &self,
    user_id: Uuid,
    item_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn has_liked(
    &self,
    user_id: Uuid,
    item_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Feed reads ────────────────────────────────────────────────────────

  /// Active posts in `(created_at desc, id desc)` order, strictly after
  /// `after` when given, at most `limit` rows.
  fn latest(
    &self,
    viewer: Option<Uuid>,
    after: Option<Cursor>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<FeedEntry>, Self::Error>> + Send + '_;

  /// Trending candidates: the `pool` most recent active posts together with
  /// every active post that gained a like or an active reply since `since`,
  /// each with its likes and active replies counted from `since` onwards.
  fn trending_candidates(
    &self,
    viewer: Option<Uuid>,
    since: DateTime<Utc>,
    pool: usize,
  ) -> impl Future<Output = Result<Vec<TrendingCandidate>, Self::Error>> + Send + '_;

  // ── Threads ───────────────────────────────────────────────────────────

  /// Active replies of a post at every depth, oldest first. A removed post
  /// yields no replies; a missing id or a reply id is an error.
  fn replies_for_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  // ── Repair ────────────────────────────────────────────────────────────

  /// Recompute an item's counters from its like and reply records. Returns
  /// `true` if a cached counter had drifted and was rewritten.
  fn reconcile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Reconcile every item; returns the number of items repaired.
  fn reconcile_all(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
