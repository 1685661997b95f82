//! Conversions between Rust values and the plain representations stored in
//! SQLite columns.
//!
//! Timestamps are RFC 3339 strings, bodies are compact JSON, versions are
//! `INTEGER`s (signed in SQLite, unsigned in the store API).

use chrono::{DateTime, Utc};
use rtboard_core::store::Versioned;
use serde_json::Value;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_body(body: &Value) -> Result<String> { Ok(serde_json::to_string(body)?) }

pub fn encode_version(v: u64) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::VersionOverflow(v))
}

pub fn decode_version(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Version(v))
}

/// A row from `objects` before JSON decoding.
pub struct RawObject {
  pub version: i64,
  pub body:    String,
}

impl RawObject {
  pub fn into_versioned(self) -> Result<Versioned<Value>> {
    Ok(Versioned {
      version: decode_version(self.version)?,
      object:  serde_json::from_str(&self.body)?,
    })
  }
}
