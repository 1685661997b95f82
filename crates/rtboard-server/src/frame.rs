//! Binary wire framing.
//!
//! A frame is five fields, each prefixed by its length as a big-endian `u32`:
//! room, event, destination, source, payload. The first four are UTF-8; the
//! payload is opaque bytes (JSON for submissions).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use rtboard_core::event::OutboundEvent;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
  #[error("frame truncated in {0} field")]
  Truncated(&'static str),

  #[error("{0} field is not valid UTF-8")]
  Utf8(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
  pub room:    String,
  pub event:   String,
  /// Target connection id; empty means the whole room.
  pub dst:     String,
  pub src:     String,
  pub payload: Bytes,
}

impl Frame {
  pub fn new(
    room: impl Into<String>,
    event: impl Into<String>,
    src: impl Into<String>,
    payload: impl Into<Bytes>,
  ) -> Self {
    Self {
      room:    room.into(),
      event:   event.into(),
      dst:     String::new(),
      src:     src.into(),
      payload: payload.into(),
    }
  }

  pub fn encode(&self) -> Bytes {
    let len = 20
      + self.room.len()
      + self.event.len()
      + self.dst.len()
      + self.src.len()
      + self.payload.len();
    let mut buf = BytesMut::with_capacity(len);
    for field in [&self.room, &self.event, &self.dst, &self.src] {
      put_field(&mut buf, field.as_bytes());
    }
    put_field(&mut buf, &self.payload);
    buf.freeze()
  }

  /// Decode one frame. Bytes after the payload are ignored.
  pub fn decode(mut buf: Bytes) -> Result<Self, FrameError> {
    let room = take_string(&mut buf, "room")?;
    let event = take_string(&mut buf, "event")?;
    let dst = take_string(&mut buf, "dst")?;
    let src = take_string(&mut buf, "src")?;
    let payload = take_field(&mut buf, "payload")?;
    Ok(Self { room, event, dst, src, payload })
  }
}

impl From<OutboundEvent> for Frame {
  fn from(event: OutboundEvent) -> Self {
    Self {
      room:    event.room,
      event:   event.event,
      dst:     event.dst,
      src:     event.src,
      payload: Bytes::from(event.payload),
    }
  }
}

fn put_field(buf: &mut BytesMut, field: &[u8]) {
  // Fields are bounded by the websocket message size, far below u32::MAX.
  buf.put_u32(field.len() as u32);
  buf.put_slice(field);
}

fn take_field(buf: &mut Bytes, name: &'static str) -> Result<Bytes, FrameError> {
  if buf.remaining() < 4 {
    return Err(FrameError::Truncated(name));
  }
  let len = buf.get_u32() as usize;
  if buf.remaining() < len {
    return Err(FrameError::Truncated(name));
  }
  Ok(buf.split_to(len))
}

fn take_string(buf: &mut Bytes, name: &'static str) -> Result<String, FrameError> {
  let raw = take_field(buf, name)?;
  String::from_utf8(raw.to_vec()).map_err(|_| FrameError::Utf8(name))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_matches_length_prefixed_fields() {
    let frame = Frame::new("g", "join", "c1", "[]");
    let bytes = frame.encode();
    assert_eq!(
      &bytes[..],
      b"\0\0\0\x01g\0\0\0\x04join\0\0\0\0\0\0\0\x02c1\0\0\0\x02[]"
    );
  }

  #[test]
  fn decodes_what_it_encodes() {
    let mut frame = Frame::new("topic", "new-reply", "conn", r#"{"a":1}"#);
    frame.dst = "other".into();
    assert_eq!(Frame::decode(frame.encode()).unwrap(), frame);
  }

  #[test]
  fn truncated_frames_are_rejected() {
    let bytes = Frame::new("room", "event", "src", "payload").encode();
    let cut = bytes.slice(..bytes.len() - 1);
    assert_eq!(Frame::decode(cut), Err(FrameError::Truncated("payload")));
    assert_eq!(
      Frame::decode(Bytes::from_static(b"\0\0")),
      Err(FrameError::Truncated("room"))
    );
  }

  #[test]
  fn non_utf8_header_is_rejected() {
    let bytes = Bytes::from_static(b"\0\0\0\x01\xff");
    assert_eq!(Frame::decode(bytes), Err(FrameError::Utf8("room")));
  }

  #[test]
  fn outbound_events_convert_field_for_field() {
    let frame = Frame::from(OutboundEvent {
      room:    "g".into(),
      event:   "new-thread".into(),
      dst:     String::new(),
      src:     "c1".into(),
      payload: "{}".into(),
    });
    assert_eq!(frame, Frame::new("g", "new-thread", "c1", "{}"));
  }
}
