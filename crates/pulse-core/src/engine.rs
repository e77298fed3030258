//! [`Engine`]: the like/unlike operation and the feed query planner, composed
//! over an [`EngagementStore`] and a [`Notifier`].
//!
//! The acting user is always an explicit argument; nothing here reads ambient
//! request state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  feed::{
    FeedMode, FeedPage, FeedRequest, ItemSummary, RankingConfig, page_latest,
    rank_trending,
  },
  item::{ContentStatus, Item, ItemKind, NewPost, NewReply},
  like::{LikeOutcome, UnlikeOutcome},
  notify::{NotificationEvent, NotificationKind, Notifier},
  store::EngagementStore,
  thread::{ReplyNode, build_reply_tree},
};

fn store_err<E: Into<Error>>(e: E) -> Error { e.into() }

#[derive(Clone)]
pub struct Engine<S> {
  store:    S,
  notifier: Arc<dyn Notifier>,
  ranking:  RankingConfig,
}

impl<S: EngagementStore> Engine<S> {
  pub fn new(store: S, notifier: Arc<dyn Notifier>, ranking: RankingConfig) -> Self {
    Self { store, notifier, ranking }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn ranking(&self) -> &RankingConfig { &self.ranking }

  async fn require_item(&self, id: Uuid) -> Result<Item> {
    self
      .store
      .get_item(id)
      .await
      .map_err(store_err)?
      .ok_or(Error::ItemNotFound(id))
  }

  // ── Like / unlike ─────────────────────────────────────────────────────

  /// Like `item_id` as `actor`. Repeating the call is harmless and reports
  /// `created: false`; only the first call notifies the item's author.
  pub async fn like(&self, actor: Uuid, item_id: Uuid) -> Result<LikeOutcome> {
    let item = self.require_item(item_id).await?;

    let created = match self.store.insert_like(actor, item_id).await.map_err(store_err)? {
      Ok(created) => {
        tracing::debug!(%actor, %item_id, like_count = created.like_count, "like created");
        true
      }
      Err(_already_exists) => {
        tracing::debug!(%actor, %item_id, "like already present");
        false
      }
    };

    if created && item.author_id != actor {
      self.notifier.notify(NotificationEvent {
        kind:          NotificationKind::Like,
        actor,
        target_author: item.author_id,
        target_id:     item_id,
        target_kind:   item.kind,
      });
    }

    Ok(LikeOutcome { liked: true, created })
  }

  /// Remove `actor`'s like from `item_id`, if there is one.
  pub async fn unlike(&self, actor: Uuid, item_id: Uuid) -> Result<UnlikeOutcome> {
    self.require_item(item_id).await?;
    let deleted = self.store.delete_like(actor, item_id).await.map_err(store_err)?;
    tracing::debug!(%actor, %item_id, deleted, "unlike");
    Ok(UnlikeOutcome { liked: false, deleted })
  }

  // ── Feed ──────────────────────────────────────────────────────────────

  pub async fn feed(&self, viewer: Option<Uuid>, request: &FeedRequest) -> Result<FeedPage> {
    self.feed_at(viewer, request, Utc::now()).await
  }

  /// [`Engine::feed`] with an explicit clock for the trending decay.
  pub async fn feed_at(
    &self,
    viewer:  Option<Uuid>,
    request: &FeedRequest,
    now:     DateTime<Utc>,
  ) -> Result<FeedPage> {
    let limit = request.validate_limit()?;

    match request.mode {
      FeedMode::Latest => {
        let after = request.decode_cursor()?;
        let rows = self
          .store
          .latest(viewer, after, limit + 1)
          .await
          .map_err(store_err)?;
        Ok(page_latest(rows, limit))
      }
      FeedMode::Trending => {
        if request.cursor.is_some() {
          tracing::debug!("cursor ignored in trending mode");
        }
        let candidates = self
          .store
          .trending_candidates(viewer, self.ranking.window_start(now), self.ranking.candidate_pool)
          .await
          .map_err(store_err)?;
        Ok(rank_trending(candidates, &self.ranking.weights, now, limit))
      }
    }
  }

  /// A single active item with the viewer's like flag. Locked and removed
  /// items read as missing here; moderators see them through
  /// [`Engine::set_status`].
  pub async fn item(&self, viewer: Option<Uuid>, id: Uuid) -> Result<ItemSummary> {
    let item = self.require_item(id).await?;
    if !item.status.is_active() {
      return Err(Error::ItemNotFound(id));
    }
    let liked_by_viewer = match viewer {
      Some(user) => self.store.has_liked(user, id).await.map_err(store_err)?,
      None => false,
    };
    Ok(ItemSummary { item, liked_by_viewer, trending_score: None })
  }

  /// The active replies under `post_id` as a tree, oldest first at each
  /// level.
  pub async fn replies(&self, post_id: Uuid) -> Result<Vec<ReplyNode>> {
    let replies = self.store.replies_for_post(post_id).await.map_err(store_err)?;
    Ok(build_reply_tree(replies))
  }

  // ── Intake and moderation ─────────────────────────────────────────────

  pub async fn create_post(&self, input: NewPost) -> Result<Item> {
    self.store.add_post(input).await.map_err(store_err)
  }

  pub async fn create_reply(&self, input: NewReply) -> Result<Item> {
    let post = self.require_item(input.post_id).await?;
    if post.kind != ItemKind::Post {
      return Err(Error::NotAPost(post.item_id));
    }
    self.store.add_reply(input).await.map_err(store_err)
  }

  pub async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<Item> {
    let item = self.store.set_status(id, status).await.map_err(store_err)?;
    tracing::info!(item_id = %id, ?status, "status updated");
    Ok(item)
  }

  /// Repair drifted counters across the whole store.
  pub async fn reconcile_all(&self) -> Result<usize> {
    self.store.reconcile_all().await.map_err(store_err)
  }
}
