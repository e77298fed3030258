//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as integer unix microseconds so keyset comparisons
//! are exact. UUIDs are stored as hyphenated lowercase strings, whose text
//! order matches `Uuid`'s byte order.

use chrono::{DateTime, Utc};
use pulse_core::{
  feed::{FeedEntry, TrendingCandidate},
  item::{ContentStatus, CounterField, Item, ItemKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_micros(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_micros(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::<Utc>::from_timestamp_micros(micros)
    .ok_or_else(|| Error::Decode(format!("timestamp out of range: {micros}")))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

pub fn encode_kind(k: ItemKind) -> &'static str {
  match k {
    ItemKind::Post => "post",
    ItemKind::Reply => "reply",
  }
}

pub fn decode_kind(s: &str) -> Result<ItemKind> {
  match s {
    "post" => Ok(ItemKind::Post),
    "reply" => Ok(ItemKind::Reply),
    other => Err(Error::Decode(format!("unknown item kind: {other:?}"))),
  }
}

pub fn encode_status(s: ContentStatus) -> &'static str {
  match s {
    ContentStatus::Active => "active",
    ContentStatus::Locked => "locked",
    ContentStatus::Removed => "removed",
  }
}

pub fn decode_status(s: &str) -> Result<ContentStatus> {
  match s {
    "active" => Ok(ContentStatus::Active),
    "locked" => Ok(ContentStatus::Locked),
    "removed" => Ok(ContentStatus::Removed),
    other => Err(Error::Decode(format!("unknown content status: {other:?}"))),
  }
}

pub fn counter_column(field: CounterField) -> &'static str {
  match field {
    CounterField::Likes => "like_count",
    CounterField::Replies => "reply_count",
  }
}

/// Counters carry a `CHECK (>= 0)` constraint, so a negative value cannot be
/// read back.
pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or_default() }

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawItem::from_row`]; rows are aliased `i`.
pub const ITEM_COLUMNS: &str = "i.item_id, i.kind, i.author_id, i.post_id, \
  i.parent_reply_id, i.body, i.status, i.created_at, i.like_count, \
  i.reply_count";

/// Number of columns in [`ITEM_COLUMNS`].
pub const ITEM_COLUMN_COUNT: usize = 10;

/// An item row as read from SQLite, before decoding.
pub struct RawItem {
  pub item_id:         String,
  pub kind:            String,
  pub author_id:       String,
  pub post_id:         Option<String>,
  pub parent_reply_id: Option<String>,
  pub body:            String,
  pub status:          String,
  pub created_at:      i64,
  pub like_count:      i64,
  pub reply_count:     i64,
}

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:         row.get(0)?,
      kind:            row.get(1)?,
      author_id:       row.get(2)?,
      post_id:         row.get(3)?,
      parent_reply_id: row.get(4)?,
      body:            row.get(5)?,
      status:          row.get(6)?,
      created_at:      row.get(7)?,
      like_count:      row.get(8)?,
      reply_count:     row.get(9)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:         decode_uuid(&self.item_id)?,
      kind:            decode_kind(&self.kind)?,
      author_id:       decode_uuid(&self.author_id)?,
      post_id:         self.post_id.as_deref().map(decode_uuid).transpose()?,
      parent_reply_id: self
        .parent_reply_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      body:            self.body,
      status:          decode_status(&self.status)?,
      created_at:      decode_micros(self.created_at)?,
      like_count:      decode_count(self.like_count),
      reply_count:     decode_count(self.reply_count),
    })
  }
}

/// A feed row: an item plus the viewer's like flag and, for trending reads,
/// the windowed engagement counts.
pub struct RawFeedRow {
  pub item:           RawItem,
  pub liked:          bool,
  pub recent_likes:   i64,
  pub recent_replies: i64,
}

impl RawFeedRow {
  /// Read an item followed by the `liked` flag and, when `windowed`, the
  /// `recent_likes` and `recent_replies` counts.
  pub fn from_row(row: &rusqlite::Row<'_>, windowed: bool) -> rusqlite::Result<Self> {
    let item = RawItem::from_row(row)?;
    let liked = row.get(ITEM_COLUMN_COUNT)?;
    let (recent_likes, recent_replies) = if windowed {
      (row.get(ITEM_COLUMN_COUNT + 1)?, row.get(ITEM_COLUMN_COUNT + 2)?)
    } else {
      (0, 0)
    };
    Ok(Self { item, liked, recent_likes, recent_replies })
  }

  pub fn into_entry(self) -> Result<FeedEntry> {
    Ok(FeedEntry { item: self.item.into_item()?, liked_by_viewer: self.liked })
  }

  pub fn into_candidate(self) -> Result<TrendingCandidate> {
    let recent_likes   = decode_count(self.recent_likes);
    let recent_replies = decode_count(self.recent_replies);
    Ok(TrendingCandidate { entry: self.into_entry()?, recent_likes, recent_replies })
  }
}
