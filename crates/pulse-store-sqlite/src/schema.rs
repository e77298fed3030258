//! SQL schema for the pulse SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Posts and replies. Counters are caches of the likes / replies tables and
-- are only ever moved by +1 / -1 deltas (or rewritten by reconciliation).
CREATE TABLE IF NOT EXISTS items (
    item_id         TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,               -- 'post' | 'reply'
    author_id       TEXT NOT NULL,
    post_id         TEXT REFERENCES items(item_id),
    parent_reply_id TEXT REFERENCES items(item_id),
    body            TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'active',
    created_at      INTEGER NOT NULL,            -- unix micros; immutable
    like_count      INTEGER NOT NULL DEFAULT 0,
    reply_count     INTEGER NOT NULL DEFAULT 0,
    CHECK (like_count  >= 0),
    CHECK (reply_count >= 0),
    CHECK ((kind = 'post') = (post_id IS NULL))
);

-- One row per (user, item); the UNIQUE constraint is what makes likes
-- idempotent under concurrency.
CREATE TABLE IF NOT EXISTS likes (
    like_id    TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    item_id    TEXT NOT NULL REFERENCES items(item_id),
    created_at INTEGER NOT NULL,
    UNIQUE (user_id, item_id)
);

CREATE INDEX IF NOT EXISTS items_feed_idx    ON items(kind, status, created_at, item_id);
CREATE INDEX IF NOT EXISTS items_post_idx    ON items(post_id, created_at);
-- Serves MAX(created_at) on insert and the trending reply window.
CREATE INDEX IF NOT EXISTS items_created_idx ON items(created_at);
CREATE INDEX IF NOT EXISTS likes_item_at_idx ON likes(item_id, created_at);
CREATE INDEX IF NOT EXISTS likes_created_idx ON likes(created_at);

PRAGMA user_version = 1;
";
