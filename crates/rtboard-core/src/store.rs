//! The `ObjectStore` trait.
//!
//! Objects are JSON documents addressed by `(topic, key)`. Every write bumps a
//! per-object version, which lets callers perform read-modify-write cycles
//! with [`ObjectStore::compare_and_swap`] instead of blind overwrites.
//!
//! The trait is implemented by storage backends (e.g. `rtboard-store-sqlite`).
//! The server depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde_json::Value;

/// A stored object together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
  pub version: u64,
  pub object:  T,
}

/// Abstraction over a topic-partitioned document store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch an object. Returns `None` if nothing is stored under the key.
  fn get<'a>(
    &'a self,
    topic: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Versioned<Value>>, Self::Error>> + Send + 'a;

  /// Unconditionally store `object`, returning its new version.
  fn put<'a>(
    &'a self,
    topic: &'a str,
    key: &'a str,
    object: &'a Value,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Store `object` only if the current version matches `expected`.
  ///
  /// `expected = None` means "only if nothing is stored yet". Returns the new
  /// version on success and `None` when another writer got there first.
  fn compare_and_swap<'a>(
    &'a self,
    topic: &'a str,
    key: &'a str,
    expected: Option<u64>,
    object: &'a Value,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + 'a;
}
