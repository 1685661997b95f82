//! [`SqliteStore`], the SQLite implementation of [`ObjectStore`].

use std::path::Path;

use chrono::Utc;
use rtboard_core::store::{ObjectStore, Versioned};
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use crate::{
  Result,
  encode::{RawObject, decode_version, encode_body, encode_dt, encode_version},
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An rtboard object store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
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

  /// Open an in-memory store, for tests.
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

  /// `UPDATE` guarded by the expected version. Returns the new version, or
  /// `None` if the row is missing or has moved on.
  async fn update_if_version(
    &self,
    topic:    String,
    key:      String,
    expected: u64,
    body:     String,
  ) -> Result<Option<u64>> {
    let expected_db = encode_version(expected)?;
    let at_str      = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE objects
              SET body = ?1, version = version + 1, updated_at = ?2
            WHERE topic = ?3 AND key = ?4 AND version = ?5",
          rusqlite::params![body, at_str, topic, key, expected_db],
        )?)
      })
      .await?;

    Ok((changed == 1).then_some(expected + 1))
  }

  /// `INSERT` that does nothing if the key is taken. Returns `Some(1)` when the
  /// row was created.
  async fn insert_if_absent(
    &self,
    topic: String,
    key:   String,
    body:  String,
  ) -> Result<Option<u64>> {
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO objects (topic, key, version, body, updated_at)
           VALUES (?1, ?2, 1, ?3, ?4)
           ON CONFLICT (topic, key) DO NOTHING",
          rusqlite::params![topic, key, body, at_str],
        )?)
      })
      .await?;

    Ok((changed == 1).then_some(1))
  }
}

// ─── ObjectStore impl ────────────────────────────────────────────────────────

impl ObjectStore for SqliteStore {
  type Error = Error;

  async fn get<'a>(
    &'a self,
    topic: &'a str,
    key:   &'a str,
  ) -> Result<Option<Versioned<Value>>> {
    let topic = topic.to_owned();
    let key   = key.to_owned();

    let raw: Option<RawObject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT version, body FROM objects WHERE topic = ?1 AND key = ?2",
            rusqlite::params![topic, key],
            |row| {
              Ok(RawObject {
                version: row.get(0)?,
                body:    row.get(1)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawObject::into_versioned).transpose()
  }

  async fn put<'a>(
    &'a self,
    topic:  &'a str,
    key:    &'a str,
    object: &'a Value,
  ) -> Result<u64> {
    let topic  = topic.to_owned();
    let key    = key.to_owned();
    let body   = encode_body(object)?;
    let at_str = encode_dt(Utc::now());

    let version: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO objects (topic, key, version, body, updated_at)
           VALUES (?1, ?2, 1, ?3, ?4)
           ON CONFLICT (topic, key) DO UPDATE
              SET version    = objects.version + 1,
                  body       = excluded.body,
                  updated_at = excluded.updated_at
           RETURNING version",
          rusqlite::params![topic, key, body, at_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    decode_version(version)
  }

  async fn compare_and_swap<'a>(
    &'a self,
    topic:    &'a str,
    key:      &'a str,
    expected: Option<u64>,
    object:   &'a Value,
  ) -> Result<Option<u64>> {
    let body = encode_body(object)?;
    match expected {
      Some(version) => {
        self
          .update_if_version(topic.to_owned(), key.to_owned(), version, body)
          .await
      }
      None => {
        self
          .insert_if_absent(topic.to_owned(), key.to_owned(), body)
          .await
      }
    }
  }
}
