//! Integration tests for `SqliteStore` against an in-memory database.

use rtboard_core::store::ObjectStore;
use serde_json::json;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get("g", "nothing").await.unwrap().is_none());
}

#[tokio::test]
async fn put_then_get_roundtrip() {
  let s = store().await;
  let obj = json!({ "hash": "abc", "replies": {}, "taggedBy": [] });

  let version = s.put("g", "abc", &obj).await.unwrap();
  assert_eq!(version, 1);

  let got = s.get("g", "abc").await.unwrap().unwrap();
  assert_eq!(got.version, 1);
  assert_eq!(got.object, obj);
}

#[tokio::test]
async fn put_overwrites_and_bumps_version() {
  let s = store().await;
  s.put("g", "k", &json!({ "n": 1 })).await.unwrap();
  let version = s.put("g", "k", &json!({ "n": 2 })).await.unwrap();

  assert_eq!(version, 2);
  let got = s.get("g", "k").await.unwrap().unwrap();
  assert_eq!(got.object, json!({ "n": 2 }));
}

#[tokio::test]
async fn topics_are_isolated() {
  let s = store().await;
  s.put("a", "k", &json!("in a")).await.unwrap();

  assert!(s.get("b", "k").await.unwrap().is_none());
  s.put("b", "k", &json!("in b")).await.unwrap();
  assert_eq!(s.get("a", "k").await.unwrap().unwrap().object, json!("in a"));
}

// ─── Compare-and-swap ────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_if_absent_succeeds_once() {
  let s = store().await;

  let first = s
    .compare_and_swap("g", "k", None, &json!({ "n": 1 }))
    .await
    .unwrap();
  assert_eq!(first, Some(1));

  let second = s
    .compare_and_swap("g", "k", None, &json!({ "n": 2 }))
    .await
    .unwrap();
  assert_eq!(second, None);
  assert_eq!(s.get("g", "k").await.unwrap().unwrap().object, json!({ "n": 1 }));
}

#[tokio::test]
async fn swap_with_current_version_succeeds() {
  let s = store().await;
  s.put("g", "k", &json!(1)).await.unwrap();

  let v = s.compare_and_swap("g", "k", Some(1), &json!(2)).await.unwrap();
  assert_eq!(v, Some(2));

  let got = s.get("g", "k").await.unwrap().unwrap();
  assert_eq!(got.version, 2);
  assert_eq!(got.object, json!(2));
}

#[tokio::test]
async fn swap_with_stale_version_is_rejected() {
  let s = store().await;
  s.put("g", "k", &json!("base")).await.unwrap();

  // Two writers read version 1; only the first may land.
  let a = s.compare_and_swap("g", "k", Some(1), &json!("a")).await.unwrap();
  let b = s.compare_and_swap("g", "k", Some(1), &json!("b")).await.unwrap();

  assert_eq!(a, Some(2));
  assert_eq!(b, None);
  assert_eq!(s.get("g", "k").await.unwrap().unwrap().object, json!("a"));
}

#[tokio::test]
async fn swap_on_missing_key_is_rejected() {
  let s = store().await;
  let v = s.compare_and_swap("g", "k", Some(1), &json!(1)).await.unwrap();
  assert_eq!(v, None);
  assert!(s.get("g", "k").await.unwrap().is_none());
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("board.sqlite3");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.put("g", "k", &json!({ "kept": true })).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let got = s.get("g", "k").await.unwrap().unwrap();
  assert_eq!(got.object, json!({ "kept": true }));
}
