//! Error type for `rtboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("stored version {0} is out of range")]
  Version(i64),

  #[error("version {0} does not fit in a database integer")]
  VersionOverflow(u64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
