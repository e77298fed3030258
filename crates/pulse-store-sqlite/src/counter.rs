//! Relative counter deltas, run inside whatever transaction the caller holds.
//!
//! Each delta is a single `UPDATE … SET c = c ± 1 … RETURNING c` statement, so
//! concurrent deltas on the same row serialise in SQLite and none is lost.

use pulse_core::item::CounterField;
use pulse_core::like::Adjustment;
use rusqlite::{Connection, OptionalExtension as _};

use crate::encode::{counter_column, decode_count};

/// Add one to `field`. Returns `None` if the item does not exist.
pub fn increment(
  conn:    &Connection,
  item_id: &str,
  field:   CounterField,
) -> rusqlite::Result<Option<Adjustment>> {
  let col = counter_column(field);
  let sql = format!("UPDATE items SET {col} = {col} + 1 WHERE item_id = ?1 RETURNING {col}");
  let value: Option<i64> = conn
    .query_row(&sql, rusqlite::params![item_id], |r| r.get(0))
    .optional()?;
  Ok(value.map(|v| Adjustment::Applied(decode_count(v))))
}

/// Subtract one from `field` unless it is already zero, in which case the
/// delta is dropped and logged. Returns `None` if the item does not exist.
pub fn decrement(
  conn:    &Connection,
  item_id: &str,
  field:   CounterField,
) -> rusqlite::Result<Option<Adjustment>> {
  let col = counter_column(field);
  let sql = format!(
    "UPDATE items SET {col} = {col} - 1 WHERE item_id = ?1 AND {col} > 0 RETURNING {col}"
  );
  let value: Option<i64> = conn
    .query_row(&sql, rusqlite::params![item_id], |r| r.get(0))
    .optional()?;

  if let Some(v) = value {
    return Ok(Some(Adjustment::Applied(decode_count(v))));
  }

  let exists = conn
    .query_row("SELECT 1 FROM items WHERE item_id = ?1", rusqlite::params![item_id], |_| Ok(()))
    .optional()?
    .is_some();
  if !exists {
    return Ok(None);
  }

  tracing::warn!(item_id, counter = col, "counter underflow: decrement clamped at zero");
  Ok(Some(Adjustment::Clamped))
}
