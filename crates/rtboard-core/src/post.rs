//! Thread and reply objects: what gets stored and broadcast.
//!
//! Replies are never stored on their own; they live inside their parent
//! thread's `replies` map and the whole thread is rewritten on every reply.
//! Serialized field names match what the browser client reads (`hash`,
//! `thread`, `taggedBy`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  Result,
  id::Identity,
  submission::{Submission, SubmissionKind},
};

// ─── Thread ──────────────────────────────────────────────────────────────────

/// A root post. Identity is `(topic, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
  #[serde(rename = "hash")]
  pub id:        String,
  pub topic:     String,
  #[serde(rename = "type")]
  pub kind:      SubmissionKind,
  pub timestamp: String,
  #[serde(default)]
  pub replies:   BTreeMap<String, Reply>,
  /// Replies that tag the thread itself; append-only.
  #[serde(rename = "taggedBy", default)]
  pub tagged_by: Vec<String>,
  #[serde(flatten)]
  pub extra:     Map<String, Value>,
}

impl Thread {
  /// Deserialize a thread from its stored JSON form.
  pub fn from_json(value: Value) -> Result<Self> { Ok(serde_json::from_value(value)?) }

  pub fn to_json(&self) -> Result<Value> { Ok(serde_json::to_value(self)?) }
}

// ─── Reply ───────────────────────────────────────────────────────────────────

/// A post attached to exactly one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  #[serde(rename = "hash")]
  pub id:        String,
  pub topic:     String,
  #[serde(rename = "type")]
  pub kind:      SubmissionKind,
  pub timestamp: String,
  #[serde(rename = "thread")]
  pub thread_id: String,
  #[serde(default)]
  pub tagging:   Vec<String>,
  /// Later replies that tag this one; append-only.
  #[serde(rename = "taggedBy", default)]
  pub tagged_by: Vec<String>,
  #[serde(flatten)]
  pub extra:     Map<String, Value>,
}

// ─── Unclassified ────────────────────────────────────────────────────────────

/// A submission whose `type` is neither `thread` nor `reply`. It is assigned
/// an identity and broadcast, but never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unclassified {
  #[serde(rename = "hash")]
  pub id:        String,
  pub topic:     String,
  #[serde(rename = "type")]
  pub kind:      SubmissionKind,
  pub timestamp: String,
  #[serde(flatten)]
  pub extra:     Map<String, Value>,
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A submission with its identity assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum Post {
  Thread(Thread),
  Reply(Reply),
  Other(Unclassified),
}

impl Post {
  /// Combine a validated submission with its generated identity. Any media
  /// must already have been replaced by its metadata.
  pub fn new(submission: Submission, identity: &Identity) -> Self {
    let Submission {
      topic,
      kind,
      thread_id,
      tagging,
      extra,
      ..
    } = submission;
    let id = identity.id.clone();
    let timestamp = identity.timestamp.clone();

    match (kind, thread_id) {
      (SubmissionKind::Thread, _) => Self::Thread(Thread {
        id,
        topic,
        kind: SubmissionKind::Thread,
        timestamp,
        replies: BTreeMap::new(),
        tagged_by: Vec::new(),
        extra,
      }),
      (SubmissionKind::Reply, Some(thread_id)) => Self::Reply(Reply {
        id,
        topic,
        kind: SubmissionKind::Reply,
        timestamp,
        thread_id,
        tagging,
        tagged_by: Vec::new(),
        extra,
      }),
      // A reply without a parent cannot come out of `Submission::from_value`;
      // treat it like any other unknown kind rather than panicking.
      (kind, _) => Self::Other(Unclassified {
        id,
        topic,
        kind,
        timestamp,
        extra,
      }),
    }
  }

  pub fn id(&self) -> &str {
    match self {
      Self::Thread(t) => &t.id,
      Self::Reply(r) => &r.id,
      Self::Other(o) => &o.id,
    }
  }

  pub fn topic(&self) -> &str {
    match self {
      Self::Thread(t) => &t.topic,
      Self::Reply(r) => &r.topic,
      Self::Other(o) => &o.topic,
    }
  }

  pub fn kind(&self) -> &SubmissionKind {
    match self {
      Self::Thread(t) => &t.kind,
      Self::Reply(r) => &r.kind,
      Self::Other(o) => &o.kind,
    }
  }

  pub fn to_json(&self) -> Result<Value> {
    Ok(match self {
      Self::Thread(t) => serde_json::to_value(t)?,
      Self::Reply(r) => serde_json::to_value(r)?,
      Self::Other(o) => serde_json::to_value(o)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use serde_json::json;
  use uuid::Uuid;

  use super::*;

  fn identity() -> Identity {
    Identity::derive(
      &Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap(),
      Uuid::nil(),
    )
  }

  #[test]
  fn thread_serializes_with_client_field_names() {
    let submission = Submission::from_value(json!({
      "type": "thread",
      "topic": "g",
      "comment": "hello",
    }))
    .unwrap();
    let Post::Thread(thread) = Post::new(submission, &identity()) else {
      panic!("expected a thread");
    };

    let value = thread.to_json().unwrap();
    assert_eq!(value["hash"], identity().id.as_str());
    assert_eq!(value["type"], "thread");
    assert_eq!(value["topic"], "g");
    assert_eq!(value["timestamp"], "3/5/2024(Tue)9:7:3");
    assert_eq!(value["replies"], json!({}));
    assert_eq!(value["taggedBy"], json!([]));
    assert_eq!(value["comment"], "hello");
    assert!(value.get("uuid").is_none());

    assert_eq!(Thread::from_json(value).unwrap(), thread);
  }

  #[test]
  fn reply_carries_parent_and_tags() {
    let submission = Submission::from_value(json!({
      "type": "reply",
      "topic": "g",
      "thread": "abc",
      "tagging": ["abc"],
    }))
    .unwrap();
    let post = Post::new(submission, &identity());
    assert_eq!(post.kind(), &SubmissionKind::Reply);

    let value = post.to_json().unwrap();
    assert_eq!(value["thread"], "abc");
    assert_eq!(value["tagging"], json!(["abc"]));
    assert_eq!(value["taggedBy"], json!([]));
  }

  #[test]
  fn unknown_kind_becomes_unclassified() {
    let submission =
      Submission::from_value(json!({ "type": "poll", "topic": "g", "q": 1 }))
        .unwrap();
    let post = Post::new(submission, &identity());
    assert!(matches!(post, Post::Other(_)));
    assert_eq!(post.topic(), "g");
    assert_eq!(post.to_json().unwrap()["q"], 1);
  }
}
