//! SQL schema for the rtboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One JSON document per (topic, key). `version` starts at 1 and grows by one
-- on every write; conditional writes compare against it.
CREATE TABLE IF NOT EXISTS objects (
    topic       TEXT    NOT NULL,
    key         TEXT    NOT NULL,
    version     INTEGER NOT NULL,
    body        TEXT    NOT NULL,   -- compact JSON
    updated_at  TEXT    NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (topic, key)
);

PRAGMA user_version = 1;
";
