//! Identifier derivation for new submissions.
//!
//! Every submission receives three values: a human-readable timestamp, a
//! random v4 UUID used purely as entropy, and a short content id taken from
//! the SHA-256 of the two. Only the timestamp and the content id are stored.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Number of hex characters kept from the digest.
pub const ID_LEN: usize = 9;

/// The system-assigned identity of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  /// `month/day/year(dow)hour:minute:second`, no zero padding.
  pub timestamp: String,
  pub uuid:      Uuid,
  /// First [`ID_LEN`] hex characters of `SHA-256(timestamp + uuid)`.
  pub id:        String,
}

impl Identity {
  /// Identity for a submission arriving now, in the server's local time zone.
  pub fn generate() -> Self { Self::derive(&Local::now(), Uuid::new_v4()) }

  /// Deterministic derivation from an explicit instant and UUID.
  pub fn derive<Tz: TimeZone>(now: &DateTime<Tz>, uuid: Uuid) -> Self {
    let timestamp = format_timestamp(now);
    let id = content_id(&timestamp, &uuid);
    Self { timestamp, uuid, id }
  }
}

/// Render `now` as e.g. `3/5/2024(Tue)9:7:3`.
pub fn format_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
  format!(
    "{}/{}/{}({}){}:{}:{}",
    now.month(),
    now.day(),
    now.year(),
    now.weekday(),
    now.hour(),
    now.minute(),
    now.second(),
  )
}

/// Short content id over `timestamp` immediately followed by the dashed UUID.
pub fn content_id(timestamp: &str, uuid: &Uuid) -> String {
  let mut hasher = Sha256::new();
  hasher.update(timestamp.as_bytes());
  hasher.update(uuid.hyphenated().to_string().as_bytes());
  let mut hex = hex::encode(hasher.finalize());
  hex.truncate(ID_LEN);
  hex
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use chrono::{FixedOffset, TimeZone, Utc};

  use super::*;

  #[test]
  fn timestamp_has_no_zero_padding() {
    // 2024-03-05 was a Tuesday.
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap();
    assert_eq!(format_timestamp(&at), "3/5/2024(Tue)9:7:3");
  }

  #[test]
  fn timestamp_uses_the_instant_offset() {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let at = tz.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
    assert_eq!(format_timestamp(&at), "12/31/2023(Sun)23:59:59");
  }

  #[test]
  fn id_is_prefix_of_sha256_over_timestamp_and_uuid() {
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap();
    let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    let identity = Identity::derive(&at, uuid);

    let expected = hex::encode(Sha256::digest(
      b"3/5/2024(Tue)9:7:367e55044-10b1-426f-9247-bb680e5fe0c8",
    ));
    assert_eq!(identity.id, expected[..ID_LEN]);
    assert_eq!(identity.timestamp, "3/5/2024(Tue)9:7:3");
    assert_eq!(identity.uuid, uuid);
  }

  #[test]
  fn generated_ids_are_short_hex_and_distinct() {
    let ids: HashSet<String> =
      (0..200).map(|_| Identity::generate().id).collect();
    assert_eq!(ids.len(), 200);
    for id in &ids {
      assert_eq!(id.len(), ID_LEN);
      assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
  }
}
