//! [`SqliteStore`], the SQLite implementation of [`EngagementStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use pulse_core::{
  Error as CoreError,
  cursor::Cursor,
  feed::{FeedEntry, TrendingCandidate},
  item::{ContentStatus, CounterField, Item, ItemKind, NewPost, NewReply},
  like::{Adjustment, AlreadyExists, Created, Like, LikeInsertion},
  store::EngagementStore,
};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  counter,
  encode::{
    ITEM_COLUMNS, RawFeedRow, RawItem, decode_micros, encode_kind,
    encode_micros, encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn fetch_item(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawItem>> {
  conn
    .query_row(
      &format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.item_id = ?1"),
      rusqlite::params![id],
      RawItem::from_row,
    )
    .optional()
}

fn item_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM items WHERE item_id = ?1", rusqlite::params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// `created_at` for a new row: the requested time, raised to the latest
/// existing `created_at` so insert order is never contradicted.
fn next_created_at(conn: &Connection, requested: i64) -> rusqlite::Result<i64> {
  let latest: Option<i64> =
    conn.query_row("SELECT MAX(created_at) FROM items", [], |r| r.get(0))?;
  Ok(latest.map_or(requested, |l| l.max(requested)))
}

/// Recompute one item's counters. `None` if the item does not exist,
/// otherwise whether anything was rewritten.
fn reconcile_one(conn: &Connection, id: &str) -> rusqlite::Result<Option<bool>> {
  let row: Option<(i64, i64, i64, i64)> = conn
    .query_row(
      "SELECT
         i.like_count,
         i.reply_count,
         (SELECT COUNT(*) FROM likes l WHERE l.item_id = i.item_id),
         (SELECT COUNT(*) FROM items r
            WHERE r.post_id = i.item_id AND r.status = 'active')
       FROM items i
       WHERE i.item_id = ?1",
      rusqlite::params![id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )
    .optional()?;

  let Some((likes, replies, true_likes, true_replies)) = row else {
    return Ok(None);
  };
  if likes == true_likes && replies == true_replies {
    return Ok(Some(false));
  }

  tracing::warn!(
    item_id = id,
    likes,
    true_likes,
    replies,
    true_replies,
    "repairing drifted counters"
  );
  conn.execute(
    "UPDATE items SET like_count = ?2, reply_count = ?3 WHERE item_id = ?1",
    rusqlite::params![id, true_likes, true_replies],
  )?;
  Ok(Some(true))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An engagement store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, so each `call` closure runs in isolation.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a statement directly, bypassing the store's invariants.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: String) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(&sql, [])?)).await?)
  }

  /// Evaluate a single-integer query.
  #[cfg(test)]
  pub(crate) async fn query_i64(&self, sql: String) -> Result<i64> {
    Ok(self.conn.call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?)).await?)
  }
}

// ─── EngagementStore impl ────────────────────────────────────────────────────

impl EngagementStore for SqliteStore {
  type Error = Error;

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn add_post(&self, input: NewPost) -> Result<Item> {
    let item_id    = Uuid::new_v4();
    let id_str     = encode_uuid(item_id);
    let author_str = encode_uuid(input.author_id);
    let requested  = encode_micros(input.created_at.unwrap_or_else(Utc::now));
    let body       = input.body.clone();

    let created_at = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let created_at = next_created_at(&tx, requested)?;
        tx.execute(
          "INSERT INTO items (item_id, kind, author_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, encode_kind(ItemKind::Post), author_str, body, created_at],
        )?;
        tx.commit()?;
        Ok(created_at)
      })
      .await?;

    Ok(Item {
      item_id,
      kind: ItemKind::Post,
      author_id: input.author_id,
      post_id: None,
      parent_reply_id: None,
      body: input.body,
      status: ContentStatus::Active,
      created_at: decode_micros(created_at)?,
      like_count: 0,
      reply_count: 0,
    })
  }

  async fn add_reply(&self, input: NewReply) -> Result<Item> {
    let item_id    = Uuid::new_v4();
    let post_id    = input.post_id;
    let parent_id  = input.parent_reply_id;
    let id_str     = encode_uuid(item_id);
    let post_str   = encode_uuid(post_id);
    let parent_str = parent_id.map(encode_uuid);
    let author_str = encode_uuid(input.author_id);
    let requested  = encode_micros(input.created_at.unwrap_or_else(Utc::now));
    let body       = input.body.clone();

    let outcome: std::result::Result<i64, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let post: Option<(String, String)> = tx
          .query_row(
            "SELECT kind, status FROM items WHERE item_id = ?1",
            rusqlite::params![post_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        match post {
          None => return Ok(Err(CoreError::ItemNotFound(post_id))),
          Some((kind, _)) if kind != encode_kind(ItemKind::Post) => {
            return Ok(Err(CoreError::NotAPost(post_id)));
          }
          Some((_, status)) if status != encode_status(ContentStatus::Active) => {
            return Ok(Err(CoreError::RepliesDisabled(post_id)));
          }
          Some(_) => {}
        }

        if let (Some(parent), Some(parent_str)) = (parent_id, parent_str.as_deref()) {
          let parent_post: Option<Option<String>> = tx
            .query_row(
              "SELECT post_id FROM items WHERE item_id = ?1",
              rusqlite::params![parent_str],
              |r| r.get(0),
            )
            .optional()?;
          match parent_post {
            None => return Ok(Err(CoreError::ItemNotFound(parent))),
            Some(p) if p.as_deref() != Some(post_str.as_str()) => {
              return Ok(Err(CoreError::ParentMismatch { parent, post: post_id }));
            }
            Some(_) => {}
          }
        }

        let created_at = next_created_at(&tx, requested)?;
        tx.execute(
          "INSERT INTO items
             (item_id, kind, author_id, post_id, parent_reply_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            encode_kind(ItemKind::Reply),
            author_str,
            post_str,
            parent_str,
            body,
            created_at,
          ],
        )?;
        counter::increment(&tx, &post_str, CounterField::Replies)?;
        tx.commit()?;
        Ok(Ok(created_at))
      })
      .await?;

    let created_at = outcome?;

    Ok(Item {
      item_id,
      kind: ItemKind::Reply,
      author_id: input.author_id,
      post_id: Some(post_id),
      parent_reply_id: parent_id,
      body: input.body,
      status: ContentStatus::Active,
      created_at: decode_micros(created_at)?,
      like_count: 0,
      reply_count: 0,
    })
  }

  async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_item(conn, &id_str)?))
      .await?;
    raw.map(RawItem::into_item).transpose()
  }

  async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<Item> {
    let id_str     = encode_uuid(id);
    let status_str = encode_status(status);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(before) = fetch_item(&tx, &id_str)? else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE items SET status = ?2 WHERE item_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;

        // Keep the post's reply_count equal to its number of active replies.
        let was_active = before.status == encode_status(ContentStatus::Active);
        if before.kind == encode_kind(ItemKind::Reply)
          && was_active != status.is_active()
          && let Some(post) = before.post_id.as_deref()
        {
          if status.is_active() {
            counter::increment(&tx, post, CounterField::Replies)?;
          } else {
            counter::decrement(&tx, post, CounterField::Replies)?;
          }
        }

        let after = fetch_item(&tx, &id_str)?;
        tx.commit()?;
        Ok(after)
      })
      .await?;

    raw.ok_or(CoreError::ItemNotFound(id))?.into_item()
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn increment(&self, id: Uuid, field: CounterField) -> Result<Adjustment> {
    let id_str = encode_uuid(id);
    let adjustment = self
      .conn
      .call(move |conn| Ok(counter::increment(conn, &id_str, field)?))
      .await?;
    Ok(adjustment.ok_or(CoreError::ItemNotFound(id))?)
  }

  async fn decrement(&self, id: Uuid, field: CounterField) -> Result<Adjustment> {
    let id_str = encode_uuid(id);
    let adjustment = self
      .conn
      .call(move |conn| Ok(counter::decrement(conn, &id_str, field)?))
      .await?;
    Ok(adjustment.ok_or(CoreError::ItemNotFound(id))?)
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn insert_like(&self, user_id: Uuid, item_id: Uuid) -> Result<LikeInsertion> {
    let like = Like {
      like_id: Uuid::new_v4(),
      user_id,
      item_id,
      created_at: decode_micros(encode_micros(Utc::now()))?,
    };

    let like_str = encode_uuid(like.like_id);
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);
    let at       = encode_micros(like.created_at);

    let outcome: Option<std::result::Result<u64, AlreadyExists>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !item_exists(&tx, &item_str)? {
          return Ok(None);
        }

        let inserted = tx.execute(
          "INSERT INTO likes (like_id, user_id, item_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, item_id) DO NOTHING",
          rusqlite::params![like_str, user_str, item_str, at],
        )?;
        if inserted == 0 {
          // Dropping `tx` rolls back; no counter delta is applied.
          return Ok(Some(Err(AlreadyExists)));
        }

        let Some(Adjustment::Applied(like_count)) =
          counter::increment(&tx, &item_str, CounterField::Likes)?
        else {
          return Ok(None);
        };
        tx.commit()?;
        Ok(Some(Ok(like_count)))
      })
      .await?;

    match outcome {
      None => Err(CoreError::ItemNotFound(item_id).into()),
      Some(Err(already)) => Ok(Err(already)),
      Some(Ok(like_count)) => Ok(Ok(Created { like, like_count })),
    }
  }

  async fn delete_like(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM likes WHERE user_id = ?1 AND item_id = ?2",
          rusqlite::params![user_str, item_str],
        )?;
        if removed > 0 {
          counter::decrement(&tx, &item_str, CounterField::Likes)?;
        }
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn has_liked(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);

    let liked = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM likes WHERE user_id = ?1 AND item_id = ?2",
              rusqlite::params![user_str, item_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;

    Ok(liked)
  }

  // ── Feed reads ────────────────────────────────────────────────────────────

  async fn latest(
    &self,
    viewer: Option<Uuid>,
    after:  Option<Cursor>,
    limit:  usize,
  ) -> Result<Vec<FeedEntry>> {
    let viewer_str = viewer.map(encode_uuid);
    let after_at   = after.map(|c| encode_micros(c.created_at));
    let after_id   = after.map(|c| encode_uuid(c.item_id));
    let limit_val  = i64::try_from(limit).unwrap_or(i64::MAX);

    let rows: Vec<RawFeedRow> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ITEM_COLUMNS},
             EXISTS (SELECT 1 FROM likes l
                       WHERE l.item_id = i.item_id AND l.user_id = ?1)
           FROM items i
           WHERE i.kind = 'post'
             AND i.status = 'active'
             AND (?2 IS NULL
                  OR i.created_at < ?2
                  OR (i.created_at = ?2 AND i.item_id < ?3))
           ORDER BY i.created_at DESC, i.item_id DESC
           LIMIT ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![viewer_str, after_at, after_id, limit_val],
            |row| RawFeedRow::from_row(row, false),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(RawFeedRow::into_entry).collect()
  }

  async fn trending_candidates(
    &self,
    viewer: Option<Uuid>,
    since:  DateTime<Utc>,
    pool:   usize,
  ) -> Result<Vec<TrendingCandidate>> {
    let viewer_str = viewer.map(encode_uuid);
    let since_val  = encode_micros(since);
    let pool_val   = i64::try_from(pool).unwrap_or(i64::MAX);

    let rows: Vec<RawFeedRow> = self
      .conn
      .call(move |conn| {
        // Recency bounds only the quiet half of the candidate set; any post
        // with engagement inside the window is always scored.
        let sql = format!(
          "WITH recent AS (
             SELECT item_id FROM items
             WHERE kind = 'post' AND status = 'active'
             ORDER BY created_at DESC, item_id DESC
             LIMIT ?3
           ),
           engaged AS (
             SELECT item_id FROM likes WHERE created_at >= ?2
             UNION
             SELECT post_id FROM items
             WHERE kind = 'reply' AND status = 'active' AND created_at >= ?2
           )
           SELECT {ITEM_COLUMNS},
             EXISTS (SELECT 1 FROM likes l
                       WHERE l.item_id = i.item_id AND l.user_id = ?1),
             (SELECT COUNT(*) FROM likes l
                WHERE l.item_id = i.item_id AND l.created_at >= ?2),
             (SELECT COUNT(*) FROM items r
                WHERE r.post_id = i.item_id
                  AND r.status = 'active'
                  AND r.created_at >= ?2)
           FROM items i
           WHERE i.kind = 'post' AND i.status = 'active'
             AND (i.item_id IN (SELECT item_id FROM recent)
                  OR i.item_id IN (SELECT item_id FROM engaged))
           ORDER BY i.created_at DESC, i.item_id DESC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![viewer_str, since_val, pool_val],
            |row| RawFeedRow::from_row(row, true),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(RawFeedRow::into_candidate).collect()
  }

  // ── Threads ───────────────────────────────────────────────────────────────

  async fn replies_for_post(&self, post_id: Uuid) -> Result<Vec<Item>> {
    let post_str = encode_uuid(post_id);

    let outcome: std::result::Result<Vec<RawItem>, CoreError> = self
      .conn
      .call(move |conn| {
        let post: Option<(String, String)> = conn
          .query_row(
            "SELECT kind, status FROM items WHERE item_id = ?1",
            rusqlite::params![post_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        match post {
          None => return Ok(Err(CoreError::ItemNotFound(post_id))),
          Some((kind, _)) if kind != encode_kind(ItemKind::Post) => {
            return Ok(Err(CoreError::NotAPost(post_id)));
          }
          // A locked thread stays readable; a removed one reads as empty.
          Some((_, status)) if status == encode_status(ContentStatus::Removed) => {
            return Ok(Ok(Vec::new()));
          }
          Some(_) => {}
        }

        let sql = format!(
          "SELECT {ITEM_COLUMNS} FROM items i
           WHERE i.post_id = ?1 AND i.status = 'active'
           ORDER BY i.created_at ASC, i.item_id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![post_str], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Ok(rows))
      })
      .await?;

    outcome?.into_iter().map(RawItem::into_item).collect()
  }

  // ── Repair ────────────────────────────────────────────────────────────────

  async fn reconcile(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let repaired = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let repaired = reconcile_one(&tx, &id_str)?;
        tx.commit()?;
        Ok(repaired)
      })
      .await?;
    Ok(repaired.ok_or(CoreError::ItemNotFound(id))?)
  }

  async fn reconcile_all(&self) -> Result<usize> {
    let repaired = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let ids = {
          let mut stmt = tx.prepare("SELECT item_id FROM items")?;
          stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut repaired: usize = 0;
        for id in &ids {
          if reconcile_one(&tx, id)? == Some(true) {
            repaired += 1;
          }
        }
        tx.commit()?;
        Ok(repaired)
      })
      .await?;

    tracing::info!(repaired, "counter reconciliation finished");
    Ok(repaired)
  }
}
