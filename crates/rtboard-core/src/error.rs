//! Error types for `rtboard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("submission must be a JSON object")]
  NotAnObject,

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("field {field} must be {expected}")]
  InvalidField {
    field:    &'static str,
    expected: &'static str,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
