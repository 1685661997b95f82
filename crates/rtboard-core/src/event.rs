//! Outbound events handed to the transport for delivery.

use serde::{Deserialize, Serialize};

use crate::{Result, post::Post};

/// Event name used to tell a submitter that its submission was dropped.
pub const FAILURE_EVENT: &str = "submission-failed";

/// A message ready for framing. An empty `dst` addresses the whole room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
  pub room:    String,
  pub event:   String,
  pub dst:     String,
  pub src:     String,
  /// JSON-encoded body.
  pub payload: String,
}

/// Body of a [`FAILURE_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
  /// The inbound event that failed, e.g. `new-reply`.
  pub event:   String,
  /// Stable machine-readable code.
  pub error:   String,
  pub message: String,
}

impl OutboundEvent {
  /// Announce a finished post to every subscriber of its topic.
  pub fn broadcast(post: &Post, src: &str) -> Result<Self> {
    Ok(Self {
      room:    post.topic().to_owned(),
      event:   post.kind().event_name(),
      dst:     String::new(),
      src:     src.to_owned(),
      payload: serde_json::to_string(&post.to_json()?)?,
    })
  }

  /// Address a failure report to the connection `dst` only.
  pub fn failure(room: &str, dst: &str, failure: &Failure) -> Result<Self> {
    Ok(Self {
      room:    room.to_owned(),
      event:   FAILURE_EVENT.to_owned(),
      dst:     dst.to_owned(),
      src:     String::new(),
      payload: serde_json::to_string(failure)?,
    })
  }

  pub fn is_broadcast(&self) -> bool { self.dst.is_empty() }
}
