//! Opaque keyset-pagination cursor for the chronological feed.
//!
//! A cursor names the `(created_at, item_id)` of the last item on a page. The
//! next page holds every item strictly after it in `(created_at desc, id desc)`
//! order. On the wire it is URL-safe unpadded base64 of
//! `v1:<unix micros>:<hyphenated uuid>`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::item::Item;

const VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum CursorError {
  #[error("not valid base64")]
  Encoding,

  #[error("expected three `:`-separated fields")]
  Shape,

  #[error("unsupported cursor version {0:?}")]
  Version(String),

  #[error("bad timestamp {0:?}")]
  Timestamp(String),

  #[error("bad item id: {0}")]
  ItemId(#[from] uuid::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub created_at: DateTime<Utc>,
  pub item_id:    Uuid,
}

impl Cursor {
  pub fn new(created_at: DateTime<Utc>, item_id: Uuid) -> Self {
    Self { created_at, item_id }
  }

  /// The cursor pointing just past `item`.
  pub fn after(item: &Item) -> Self { Self::new(item.created_at, item.item_id) }

  pub fn encode(&self) -> String {
    let raw = format!(
      "{VERSION}:{}:{}",
      self.created_at.timestamp_micros(),
      self.item_id.hyphenated()
    );
    B64.encode(raw)
  }

  pub fn decode(token: &str) -> Result<Self, CursorError> {
    let bytes = B64.decode(token.trim()).map_err(|_| CursorError::Encoding)?;
    let raw = std::str::from_utf8(&bytes).map_err(|_| CursorError::Encoding)?;

    let mut parts = raw.splitn(3, ':');
    let (Some(version), Some(micros), Some(id)) =
      (parts.next(), parts.next(), parts.next())
    else {
      return Err(CursorError::Shape);
    };

    if version != VERSION {
      return Err(CursorError::Version(version.to_owned()));
    }

    let created_at = micros
      .parse::<i64>()
      .ok()
      .and_then(DateTime::<Utc>::from_timestamp_micros)
      .ok_or_else(|| CursorError::Timestamp(micros.to_owned()))?;
    let item_id = Uuid::parse_str(id)?;

    Ok(Self { created_at, item_id })
  }

  /// The next-page predicate: `true` if an item with this sort key belongs
  /// after the cursor.
  pub fn admits(&self, created_at: DateTime<Utc>, item_id: Uuid) -> bool {
    created_at < self.created_at
      || (created_at == self.created_at && item_id < self.item_id)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn t(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn encode_then_decode() {
    let at = DateTime::<Utc>::from_timestamp_micros(1_700_000_000_123_456).unwrap();
    let c = Cursor::new(at, Uuid::new_v4());
    assert_eq!(Cursor::decode(&c.encode()).unwrap(), c);
  }

  #[test]
  fn token_is_url_safe() {
    let c = Cursor::new(t(1_700_000_000), Uuid::max());
    let token = c.encode();
    assert!(token.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(Cursor::decode("!!!"), Err(CursorError::Encoding)));
  }

  #[test]
  fn rejects_wrong_shape() {
    let token = B64.encode("v1:12345");
    assert!(matches!(Cursor::decode(&token), Err(CursorError::Shape)));
  }

  #[test]
  fn rejects_unknown_version() {
    let token = B64.encode(format!("v9:0:{}", Uuid::nil()));
    assert!(matches!(Cursor::decode(&token), Err(CursorError::Version(v)) if v == "v9"));
  }

  #[test]
  fn rejects_bad_timestamp() {
    let token = B64.encode(format!("v1:yesterday:{}", Uuid::nil()));
    assert!(matches!(Cursor::decode(&token), Err(CursorError::Timestamp(_))));
  }

  #[test]
  fn rejects_bad_uuid() {
    let token = B64.encode("v1:0:not-a-uuid");
    assert!(matches!(Cursor::decode(&token), Err(CursorError::ItemId(_))));
  }

  #[test]
  fn predicate_breaks_ties_on_id() {
    let lo = Uuid::from_u128(1);
    let hi = Uuid::from_u128(2);
    let c = Cursor::new(t(100), hi);

    assert!(c.admits(t(99), Uuid::max()));
    assert!(c.admits(t(100), lo));
    assert!(!c.admits(t(100), hi));
    assert!(!c.admits(t(101), lo));
  }
}
