//! `data:` URI decoding (RFC 2397).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::{Error, Result};

const DEFAULT_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
  pub media_type: String,
  pub data:       Vec<u8>,
}

/// Decode `data:[<media type>][;base64],<data>`.
///
/// Base64 bodies may contain ASCII whitespace; other bodies are
/// percent-decoded.
pub fn decode(input: &str) -> Result<DataUrl> {
  let rest = input
    .get(..5)
    .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
    .map(|_| &input[5..])
    .ok_or(Error::MalformedDataUrl("missing data: scheme"))?;

  let (header, body) = rest
    .split_once(',')
    .ok_or(Error::MalformedDataUrl("missing ',' separator"))?;

  let (media_type, is_base64) = match header.rsplit_once(';') {
    Some((mt, param)) if param.eq_ignore_ascii_case("base64") => (mt, true),
    _ => (header, false),
  };

  let data = if is_base64 {
    let compact: Vec<u8> = body
      .bytes()
      .filter(|b| !b.is_ascii_whitespace())
      .collect();
    B64.decode(compact)?
  } else {
    percent_decode(body)?
  };

  let media_type = if media_type.is_empty() {
    DEFAULT_MEDIA_TYPE.to_owned()
  } else {
    media_type.to_owned()
  };

  Ok(DataUrl { media_type, data })
}

fn percent_decode(input: &str) -> Result<Vec<u8>> {
  let bytes = input.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'%' {
      let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
      let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
      match (hi, lo) {
        (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
        _ => return Err(Error::MalformedDataUrl("bad percent escape")),
      }
      i += 3;
    } else {
      out.push(bytes[i]);
      i += 1;
    }
  }
  Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
  match b {
    b'0'..=b'9' => Some(b - b'0'),
    b'a'..=b'f' => Some(b - b'a' + 10),
    b'A'..=b'F' => Some(b - b'A' + 10),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base64_body() {
    let url = decode("data:image/png;base64,aGVs bG8=").unwrap();
    assert_eq!(url.media_type, "image/png");
    assert_eq!(url.data, b"hello");
  }

  #[test]
  fn percent_encoded_body_with_default_type() {
    let url = decode("data:,a%20b%2Cc").unwrap();
    assert_eq!(url.media_type, DEFAULT_MEDIA_TYPE);
    assert_eq!(url.data, b"a b,c");
  }

  #[test]
  fn scheme_is_case_insensitive() {
    let url = decode("DATA:text/plain;BASE64,eA==").unwrap();
    assert_eq!(url.data, b"x");
  }

  #[test]
  fn rejects_malformed_input() {
    assert!(matches!(
      decode("http://example.com/a.png"),
      Err(Error::MalformedDataUrl(_))
    ));
    assert!(matches!(
      decode("data:image/png;base64"),
      Err(Error::MalformedDataUrl(_))
    ));
    assert!(matches!(
      decode("data:image/png;base64,@@@"),
      Err(Error::Base64(_))
    ));
    assert!(matches!(decode("data:,%zz"), Err(Error::MalformedDataUrl(_))));
  }
}
