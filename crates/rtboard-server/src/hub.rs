//! Topic router: which connection is in which room, and delivery to them.
//!
//! Every connection owns an unbounded outbox drained by its socket task. The
//! hub only ever pushes frames into outboxes, so delivery never waits on a
//! slow peer while the registry lock is held.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::frame::Frame;

/// The room every connection belongs to from the moment it connects.
pub const ROOT_ROOM: &str = "root";

pub type Outbox = mpsc::UnboundedSender<Frame>;

#[derive(Default)]
pub struct Hub {
  inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
  connections: HashMap<String, Outbox>,
  rooms:       HashMap<String, BTreeSet<String>>,
}

impl Registry {
  fn deliver(&self, conn_id: &str, frame: Frame) -> bool {
    match self.connections.get(conn_id) {
      Some(outbox) => outbox.send(frame).is_ok(),
      None => false,
    }
  }

  fn members(&self, room: &str) -> Vec<String> {
    self
      .rooms
      .get(room)
      .map(|m| m.iter().cloned().collect())
      .unwrap_or_default()
  }
}

impl Hub {
  pub fn new() -> Self { Self::default() }

  /// Register a connection and place it in [`ROOT_ROOM`]. Returns the root
  /// members, the new connection included.
  pub async fn connect(&self, conn_id: &str, outbox: Outbox) -> Vec<String> {
    let mut reg = self.inner.lock().await;
    reg.connections.insert(conn_id.to_owned(), outbox);
    reg
      .rooms
      .entry(ROOT_ROOM.to_owned())
      .or_default()
      .insert(conn_id.to_owned());
    reg.members(ROOT_ROOM)
  }

  /// Forget a connection and drop it from every room.
  pub async fn disconnect(&self, conn_id: &str) {
    let mut reg = self.inner.lock().await;
    reg.connections.remove(conn_id);
    reg.rooms.retain(|_, members| {
      members.remove(conn_id);
      !members.is_empty()
    });
  }

  /// Add `conn_id` to `room`; returns the members after joining.
  pub async fn join(&self, room: &str, conn_id: &str) -> Vec<String> {
    let mut reg = self.inner.lock().await;
    reg
      .rooms
      .entry(room.to_owned())
      .or_default()
      .insert(conn_id.to_owned());
    reg.members(room)
  }

  pub async fn leave(&self, room: &str, conn_id: &str) {
    let mut reg = self.inner.lock().await;
    if let Some(members) = reg.rooms.get_mut(room) {
      members.remove(conn_id);
      if members.is_empty() {
        reg.rooms.remove(room);
      }
    }
  }

  pub async fn members(&self, room: &str) -> Vec<String> {
    self.inner.lock().await.members(room)
  }

  /// Deliver to one connection. Returns `false` if it is gone.
  pub async fn send_to(&self, conn_id: &str, frame: Frame) -> bool {
    self.inner.lock().await.deliver(conn_id, frame)
  }

  /// Deliver to every member of the frame's room and to its source, each
  /// exactly once.
  pub async fn publish(&self, frame: Frame) {
    let reg = self.inner.lock().await;
    let mut targets: BTreeSet<&str> = reg
      .rooms
      .get(&frame.room)
      .map(|m| m.iter().map(String::as_str).collect())
      .unwrap_or_default();
    targets.insert(frame.src.as_str());

    let mut delivered = 0usize;
    for conn_id in targets {
      if reg.deliver(conn_id, frame.clone()) {
        delivered += 1;
      }
    }
    debug!(room = %frame.room, event = %frame.event, delivered, "published");
  }

  /// Forward a client-originated frame: to `dst` when set, otherwise to the
  /// other members of the room.
  pub async fn relay(&self, frame: Frame) {
    let reg = self.inner.lock().await;
    if !frame.dst.is_empty() {
      let dst = frame.dst.clone();
      reg.deliver(&dst, frame);
      return;
    }
    if let Some(members) = reg.rooms.get(&frame.room) {
      for conn_id in members.iter().filter(|m| **m != frame.src) {
        reg.deliver(conn_id, frame.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use tokio::sync::mpsc::UnboundedReceiver;

  use super::*;

  async fn connect(hub: &Hub, id: &str) -> UnboundedReceiver<Frame> {
    let (tx, rx) = mpsc::unbounded_channel();
    hub.connect(id, tx).await;
    rx
  }

  fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<Frame> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
      out.push(frame);
    }
    out
  }

  #[tokio::test]
  async fn connections_start_in_root() {
    let hub = Hub::new();
    let _a = connect(&hub, "a").await;
    let _b = connect(&hub, "b").await;
    assert_eq!(hub.members(ROOT_ROOM).await, vec!["a", "b"]);
  }

  #[tokio::test]
  async fn publish_reaches_room_and_source_once() {
    let hub = Hub::new();
    let mut a = connect(&hub, "a").await;
    let mut b = connect(&hub, "b").await;
    let mut c = connect(&hub, "c").await;
    hub.join("g", "a").await;
    hub.join("g", "b").await;

    hub.publish(Frame::new("g", "new-thread", "a", "{}")).await;

    assert_eq!(drain(&mut a).len(), 1);
    assert_eq!(drain(&mut b).len(), 1);
    assert!(drain(&mut c).is_empty());
  }

  #[tokio::test]
  async fn publish_reaches_a_source_outside_the_room() {
    let hub = Hub::new();
    let mut a = connect(&hub, "a").await;
    let mut b = connect(&hub, "b").await;
    hub.join("g", "b").await;

    hub.publish(Frame::new("g", "new-reply", "a", "{}")).await;

    assert_eq!(drain(&mut a).len(), 1);
    assert_eq!(drain(&mut b).len(), 1);
  }

  #[tokio::test]
  async fn relay_skips_the_sender_and_honours_dst() {
    let hub = Hub::new();
    let mut a = connect(&hub, "a").await;
    let mut b = connect(&hub, "b").await;
    let mut c = connect(&hub, "c").await;
    for id in ["a", "b", "c"] {
      hub.join("g", id).await;
    }

    hub.relay(Frame::new("g", "joined", "a", "a")).await;
    assert!(drain(&mut a).is_empty());
    assert_eq!(drain(&mut b).len(), 1);
    assert_eq!(drain(&mut c).len(), 1);

    let mut direct = Frame::new("g", "ping", "a", "");
    direct.dst = "c".into();
    hub.relay(direct).await;
    assert!(drain(&mut b).is_empty());
    assert_eq!(drain(&mut c).len(), 1);
  }

  #[tokio::test]
  async fn leave_and_disconnect_clean_up() {
    let hub = Hub::new();
    let _a = connect(&hub, "a").await;
    let _b = connect(&hub, "b").await;
    hub.join("g", "a").await;
    hub.join("g", "b").await;

    hub.leave("g", "a").await;
    assert_eq!(hub.members("g").await, vec!["b"]);

    hub.disconnect("b").await;
    assert!(hub.members("g").await.is_empty());
    assert_eq!(hub.members(ROOT_ROOM).await, vec!["a"]);
    assert!(!hub.send_to("b", Frame::new("g", "x", "", "")).await);
  }
}
