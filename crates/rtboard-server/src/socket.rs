//! WebSocket transport: one task per connection, binary frames both ways.
//!
//! On connect the server registers the connection in the root room and sends
//! it a `join` frame whose source is the new connection id and whose payload
//! is the JSON list of root members. After that, inbound frames are routed by
//! event name: room membership changes are handled here, submissions go to
//! [`ingest::submit`] on their own task, everything else is relayed.

use axum::{
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use rtboard_core::store::ObjectStore;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  AppState,
  frame::Frame,
  hub::ROOT_ROOM,
  ingest,
};

pub const JOIN_EVENT: &str = "join";
pub const LEAVE_EVENT: &str = "leave";
pub const NEW_THREAD_EVENT: &str = "new-thread";
pub const NEW_REPLY_EVENT: &str = "new-reply";

pub async fn handler<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
  S: ObjectStore + 'static,
{
  ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve<S>(mut socket: WebSocket, state: AppState<S>)
where
  S: ObjectStore + 'static,
{
  let conn_id = Uuid::new_v4().to_string();
  let (tx, mut outbox) = mpsc::unbounded_channel();
  let members = state.hub.connect(&conn_id, tx).await;
  debug!(conn_id = %conn_id, "connected");

  state
    .hub
    .send_to(&conn_id, members_frame(ROOT_ROOM, JOIN_EVENT, &conn_id, members))
    .await;

  loop {
    tokio::select! {
      Some(frame) = outbox.recv() => {
        if socket.send(Message::Binary(frame.encode())).await.is_err() {
          break;
        }
      }
      inbound = socket.recv() => match inbound {
        Some(Ok(Message::Binary(bytes))) => match Frame::decode(bytes) {
          Ok(frame) => dispatch(&state, &conn_id, frame).await,
          Err(e) => warn!(conn_id = %conn_id, error = %e, "undecodable frame"),
        },
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          debug!(conn_id = %conn_id, error = %e, "socket error");
          break;
        }
      },
    }
  }

  state.hub.disconnect(&conn_id).await;
  debug!(conn_id = %conn_id, "disconnected");
}

/// Route one inbound frame from `conn_id`. The frame's `src` is always
/// replaced with the connection's own id.
pub async fn dispatch<S>(state: &AppState<S>, conn_id: &str, mut frame: Frame)
where
  S: ObjectStore + 'static,
{
  frame.src = conn_id.to_owned();

  match frame.event.as_str() {
    JOIN_EVENT => {
      let members = state.hub.join(&frame.room, conn_id).await;
      debug!(conn_id, room = %frame.room, "joined room");
      let reply = members_frame(&frame.room, JOIN_EVENT, conn_id, members);
      state.hub.send_to(conn_id, reply).await;
    }
    LEAVE_EVENT => {
      state.hub.leave(&frame.room, conn_id).await;
      debug!(conn_id, room = %frame.room, "left room");
      let members = state.hub.members(&frame.room).await;
      let reply = members_frame(&frame.room, LEAVE_EVENT, conn_id, members);
      state.hub.send_to(conn_id, reply).await;
    }
    NEW_THREAD_EVENT | NEW_REPLY_EVENT => {
      let state = state.clone();
      let conn_id = conn_id.to_owned();
      tokio::spawn(async move { ingest::submit(&state, &conn_id, frame).await });
    }
    _ => state.hub.relay(frame).await,
  }
}

fn members_frame(room: &str, event: &str, src: &str, members: Vec<String>) -> Frame {
  Frame::new(room, event, src, Value::from(members).to_string())
}
