//! Error types for the rtboard-media ingestor.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed data URI: {0}")]
  MalformedDataUrl(&'static str),

  #[error("invalid base64 payload: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot read image header: {0}")]
  Image(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
