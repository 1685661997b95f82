//! Errors that abort a submission, and their mapping to failure events.

use rtboard_core::event::Failure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed submission: {0}")]
  Submission(#[from] rtboard_core::Error),

  #[error("media error: {0}")]
  Media(#[from] rtboard_media::Error),

  #[error("thread {thread} not found in topic {topic}")]
  ThreadNotFound { topic: String, thread: String },

  #[error("id {0} is already taken")]
  IdCollision(String),

  #[error("thread {thread} kept changing; gave up after {attempts} attempts")]
  WriteContention { thread: String, attempts: u32 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("cannot encode object: {0}")]
  Encode(#[source] rtboard_core::Error),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl Error {
  /// Stable code sent to clients in a failure event.
  pub fn code(&self) -> &'static str {
    match self {
      Error::Submission(_) => "malformed_submission",
      Error::Media(_) => "media",
      Error::ThreadNotFound { .. } => "thread_not_found",
      Error::IdCollision(_) => "id_collision",
      Error::WriteContention { .. } => "write_contention",
      Error::Store(_) => "store",
      Error::Encode(_) | Error::Task(_) => "internal",
    }
  }

  pub fn to_failure(&self, event: &str) -> Failure {
    Failure {
      event:   event.to_owned(),
      error:   self.code().to_owned(),
      message: self.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
