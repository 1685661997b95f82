//! The inbound submission envelope.
//!
//! Clients send an untyped JSON object. [`Submission::from_value`] validates
//! the fields the pipeline depends on, lifts them into typed fields and keeps
//! everything else in an open extension map that is passed through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Fields owned by the server. Client-supplied values are discarded.
const SYSTEM_FIELDS: &[&str] = &["hash", "uuid", "timestamp", "replies", "taggedBy"];

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The `type` of a submission. Unrecognised values are kept verbatim; they are
/// broadcast but never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionKind {
  Thread,
  Reply,
  Other(String),
}

impl SubmissionKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Thread => "thread",
      Self::Reply => "reply",
      Self::Other(s) => s,
    }
  }

  /// The outbound event name for posts of this kind, e.g. `new-reply`.
  pub fn event_name(&self) -> String { format!("new-{}", self.as_str()) }
}

impl From<String> for SubmissionKind {
  fn from(s: String) -> Self {
    match s.as_str() {
      "thread" => Self::Thread,
      "reply" => Self::Reply,
      _ => Self::Other(s),
    }
  }
}

impl From<SubmissionKind> for String {
  fn from(kind: SubmissionKind) -> Self {
    match kind {
      SubmissionKind::Other(s) => s,
      k => k.as_str().to_owned(),
    }
  }
}

impl fmt::Display for SubmissionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Media ───────────────────────────────────────────────────────────────────

/// An inline upload attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
  /// The raw `file` field, a `data:` URI.
  pub data_uri:  String,
  /// Client-side file name; informational only.
  pub file_name: String,
  /// Client-declared MIME type (`file_mime`), used to pick a header decoder.
  pub mime:      Option<String>,
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A validated inbound submission, before any identity has been assigned.
#[derive(Debug, Clone)]
pub struct Submission {
  pub topic:     String,
  pub kind:      SubmissionKind,
  /// Parent thread id; always `Some` for replies.
  pub thread_id: Option<String>,
  /// Ids referenced by a reply, de-duplicated in client order.
  pub tagging:   Vec<String>,
  /// Present when the client attached a `file`. The raw payload never
  /// reaches [`Submission::extra`].
  pub media:     Option<MediaUpload>,
  /// Every other client field, passed through unmodified.
  pub extra:     Map<String, Value>,
}

impl Submission {
  /// Parse a submission from a JSON payload.
  pub fn from_slice(payload: &[u8]) -> Result<Self> {
    Self::from_value(serde_json::from_slice(payload)?)
  }

  /// Validate an untyped JSON object.
  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(mut map) = value else {
      return Err(Error::NotAnObject);
    };

    for field in SYSTEM_FIELDS {
      map.remove(*field);
    }

    let topic = take_string(&mut map, "topic")?;
    if topic.is_empty() {
      return Err(Error::InvalidField {
        field:    "topic",
        expected: "a non-empty string",
      });
    }
    let kind = SubmissionKind::from(take_string(&mut map, "type")?);

    let (thread_id, tagging) = if kind == SubmissionKind::Reply {
      let thread_id = take_string(&mut map, "thread")?;
      let tagging = match map.remove("tagging") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => parse_tagging(value)?,
      };
      (Some(thread_id), tagging)
    } else {
      (None, Vec::new())
    };

    let media = match map.remove("file") {
      None | Some(Value::Null) => None,
      Some(Value::String(data_uri)) => {
        let file_name = match map.get("file_name") {
          Some(Value::String(name)) => name.clone(),
          Some(_) => {
            return Err(Error::InvalidField {
              field:    "file_name",
              expected: "a string",
            });
          }
          None => return Err(Error::MissingField("file_name")),
        };
        let mime = map
          .get("file_mime")
          .and_then(Value::as_str)
          .map(str::to_owned);
        Some(MediaUpload { data_uri, file_name, mime })
      }
      Some(_) => {
        return Err(Error::InvalidField {
          field:    "file",
          expected: "a data URI string",
        });
      }
    };

    Ok(Self {
      topic,
      kind,
      thread_id,
      tagging,
      media,
      extra: map,
    })
  }

  /// Record where an upload was stored and its pixel dimensions.
  pub fn record_media(&mut self, file_path: String, dimensions: String) {
    self.extra.insert("file_path".into(), Value::String(file_path));
    self
      .extra
      .insert("file_dimensions".into(), Value::String(dimensions));
  }
}

fn take_string(map: &mut Map<String, Value>, field: &'static str) -> Result<String> {
  match map.remove(field) {
    Some(Value::String(s)) => Ok(s),
    Some(_) => Err(Error::InvalidField { field, expected: "a string" }),
    None => Err(Error::MissingField(field)),
  }
}

fn parse_tagging(value: Value) -> Result<Vec<String>> {
  let invalid = Error::InvalidField {
    field:    "tagging",
    expected: "an array of strings",
  };
  let Value::Array(items) = value else {
    return Err(invalid);
  };

  let mut tags: Vec<String> = Vec::with_capacity(items.len());
  for item in items {
    let Value::String(tag) = item else {
      return Err(invalid);
    };
    if !tags.contains(&tag) {
      tags.push(tag);
    }
  }
  Ok(tags)
}
