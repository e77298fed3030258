//! Feed query planning: request/response shapes and the pure ordering logic
//! behind the two feed modes.
//!
//! - `latest` orders active posts by `(created_at desc, id desc)` and pages
//!   with a keyset [`Cursor`].
//! - `trending` orders active posts by a live [`TrendingWeights::score`]. It
//!   returns a single page with no cursor: scores move under concurrent
//!   writes, so results may shift between pages.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cursor::Cursor,
  item::Item,
  score::{ScoreInputs, TrendingWeights, age_hours},
};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Tuning for the trending mode.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
  /// Trailing window over which "recent" likes and replies are counted.
  pub velocity_window_hours: u32,
  /// How many of the most recent active posts are scored per request, on top
  /// of every post with engagement inside the window.
  pub candidate_pool:        usize,
  pub weights:               TrendingWeights,
}

impl Default for RankingConfig {
  fn default() -> Self {
    Self {
      velocity_window_hours: 3,
      candidate_pool:        1000,
      weights:               TrendingWeights::default(),
    }
  }
}

impl RankingConfig {
  /// Start of the velocity window ending at `now`.
  pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(i64::from(self.velocity_window_hours))
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
  #[default]
  Latest,
  Trending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
  pub mode:   FeedMode,
  pub limit:  usize,
  /// Opaque token from a previous `latest` page. Ignored in `trending` mode.
  pub cursor: Option<String>,
}

impl FeedRequest {
  pub fn latest(limit: usize) -> Self {
    Self { mode: FeedMode::Latest, limit, cursor: None }
  }

  pub fn trending(limit: usize) -> Self {
    Self { mode: FeedMode::Trending, limit, cursor: None }
  }

  pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
    self.cursor = Some(cursor.into());
    self
  }

  pub fn validate_limit(&self) -> Result<usize> {
    if (1..=MAX_LIMIT).contains(&self.limit) {
      Ok(self.limit)
    } else {
      Err(Error::InvalidLimit { got: self.limit, max: MAX_LIMIT })
    }
  }

  /// Decode the cursor, if any. Malformed tokens are an error, never a silent
  /// restart from the first page.
  pub fn decode_cursor(&self) -> Result<Option<Cursor>> {
    self
      .cursor
      .as_deref()
      .map(Cursor::decode)
      .transpose()
      .map_err(Error::from)
  }
}

// ─── Store rows ──────────────────────────────────────────────────────────────

/// An item as read for the feed, with the viewer's like flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
  pub item:            Item,
  pub liked_by_viewer: bool,
}

/// A feed entry plus the engagement counted inside the velocity window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingCandidate {
  pub entry:          FeedEntry,
  pub recent_likes:   u64,
  pub recent_replies: u64,
}

impl TrendingCandidate {
  pub fn score_inputs(&self, now: DateTime<Utc>) -> ScoreInputs {
    let item = &self.entry.item;
    ScoreInputs {
      likes:          item.like_count,
      replies:        item.reply_count,
      recent_likes:   self.recent_likes,
      recent_replies: self.recent_replies,
      age_hours:      age_hours(item.created_at, now),
    }
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
  #[serde(flatten)]
  pub item:            Item,
  pub liked_by_viewer: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub trending_score:  Option<f64>,
}

impl From<FeedEntry> for ItemSummary {
  fn from(e: FeedEntry) -> Self {
    Self { item: e.item, liked_by_viewer: e.liked_by_viewer, trending_score: None }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage {
  pub items:       Vec<ItemSummary>,
  /// `None` at the end of the stream, and always in `trending` mode.
  pub next_cursor: Option<String>,
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Build a `latest` page from up to `limit + 1` rows already in feed order.
/// The extra row, if present, only signals that another page exists.
pub fn page_latest(mut rows: Vec<FeedEntry>, limit: usize) -> FeedPage {
  let has_more = rows.len() > limit;
  rows.truncate(limit);

  let next_cursor = match rows.last() {
    Some(last) if has_more => Some(Cursor::after(&last.item).encode()),
    _ => None,
  };

  FeedPage { items: rows.into_iter().map(ItemSummary::from).collect(), next_cursor }
}

/// Score, order and truncate trending candidates. Equal scores fall back to
/// the chronological order.
pub fn rank_trending(
  candidates: Vec<TrendingCandidate>,
  weights:    &TrendingWeights,
  now:        DateTime<Utc>,
  limit:      usize,
) -> FeedPage {
  let mut scored: Vec<(f64, FeedEntry)> = candidates
    .into_iter()
    .map(|c| (weights.score(&c.score_inputs(now)), c.entry))
    .collect();

  scored.sort_by(|(sa, a), (sb, b)| {
    sb.total_cmp(sa)
      .then_with(|| b.item.created_at.cmp(&a.item.created_at))
      .then_with(|| b.item.item_id.cmp(&a.item.item_id))
  });
  scored.truncate(limit);

  let items = scored
    .into_iter()
    .map(|(score, entry)| ItemSummary {
      trending_score: Some(score),
      ..ItemSummary::from(entry)
    })
    .collect();

  FeedPage { items, next_cursor: None }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;
  use crate::item::{ContentStatus, ItemKind};

  fn t(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn entry(id: u128, at: DateTime<Utc>, likes: u64) -> FeedEntry {
    FeedEntry {
      item:            Item {
        item_id:         Uuid::from_u128(id),
        kind:            ItemKind::Post,
        author_id:       Uuid::nil(),
        post_id:         None,
        parent_reply_id: None,
        body:            String::new(),
        status:          ContentStatus::Active,
        created_at:      at,
        like_count:      likes,
        reply_count:     0,
      },
      liked_by_viewer: false,
    }
  }

  fn candidate(e: FeedEntry, recent_likes: u64) -> TrendingCandidate {
    TrendingCandidate { entry: e, recent_likes, recent_replies: 0 }
  }

  #[test]
  fn limit_bounds() {
    assert!(FeedRequest::latest(0).validate_limit().is_err());
    assert_eq!(FeedRequest::latest(1).validate_limit().unwrap(), 1);
    assert_eq!(FeedRequest::latest(100).validate_limit().unwrap(), 100);
    assert!(matches!(
      FeedRequest::latest(101).validate_limit(),
      Err(Error::InvalidLimit { got: 101, max: 100 })
    ));
  }

  #[test]
  fn malformed_cursor_is_an_error() {
    let req = FeedRequest::latest(10).with_cursor("%%%");
    assert!(matches!(req.decode_cursor(), Err(Error::InvalidCursor(_))));
  }

  #[test]
  fn missing_cursor_decodes_to_none() {
    assert_eq!(FeedRequest::latest(10).decode_cursor().unwrap(), None);
  }

  #[test]
  fn latest_page_with_more_rows_has_cursor() {
    let rows = vec![entry(3, t(30), 0), entry(2, t(20), 0), entry(1, t(10), 0)];
    let page = page_latest(rows, 2);
    assert_eq!(page.items.len(), 2);

    let cursor = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
    assert_eq!(cursor, Cursor::new(t(20), Uuid::from_u128(2)));
  }

  #[test]
  fn latest_page_exactly_full_has_no_cursor() {
    let rows = vec![entry(2, t(20), 0), entry(1, t(10), 0)];
    let page = page_latest(rows, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next_cursor, None);
  }

  #[test]
  fn trending_orders_by_score_and_never_pages() {
    let now = t(10 * 3600);
    let quiet = candidate(entry(1, t(9 * 3600), 1), 0);
    let busy = candidate(entry(2, t(3600), 50), 4);
    let page = rank_trending(vec![quiet, busy], &TrendingWeights::default(), now, 10);

    assert_eq!(page.items[0].item.item_id, Uuid::from_u128(2));
    assert!(page.items[0].trending_score.unwrap() > page.items[1].trending_score.unwrap());
    assert_eq!(page.next_cursor, None);
  }

  #[test]
  fn trending_ties_fall_back_to_chronological() {
    let now = t(100);
    let rows = vec![
      candidate(entry(1, t(50), 0), 0),
      candidate(entry(3, t(50), 0), 0),
      candidate(entry(2, t(50), 0), 0),
    ];
    let page = rank_trending(rows, &TrendingWeights::default(), now, 2);
    let ids: Vec<_> = page.items.iter().map(|s| s.item.item_id.as_u128()).collect();
    assert_eq!(ids, vec![3, 2]);
  }

  #[test]
  fn summary_flattens_item() {
    let summary = ItemSummary::from(entry(7, t(0), 2));
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["like_count"], 2);
    assert_eq!(json["liked_by_viewer"], false);
    assert!(json.get("trending_score").is_none());
  }

  #[test]
  fn ranking_config_defaults() {
    let cfg = RankingConfig::default();
    assert_eq!(cfg.window_start(t(4 * 3600)), t(3600));
  }
}
