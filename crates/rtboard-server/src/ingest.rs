//! The submission pipeline: validate, identify, store media, persist, compose.
//!
//! Thread creation is an insert-if-absent. Replies are a read-modify-write of
//! the parent thread guarded by the store's version counter; when another
//! writer lands first the thread is re-read and the reply re-applied.

use rtboard_core::{
  event::OutboundEvent,
  id::Identity,
  post::{Post, Reply, Thread},
  store::{ObjectStore, Versioned},
  submission::Submission,
  tagging::{DuplicateReply, attach_reply},
};
use tracing::{debug, warn};

use crate::{
  AppState,
  error::{Error, Result},
  frame::Frame,
};

/// Run one submission to completion and publish the outcome: the finished
/// post to its room on success, a failure event to `conn_id` otherwise.
pub async fn submit<S>(state: &AppState<S>, conn_id: &str, frame: Frame)
where
  S: ObjectStore + 'static,
{
  match ingest(state, conn_id, &frame.payload).await {
    Ok(event) => state.hub.publish(event.into()).await,
    Err(e) => {
      warn!(
        conn_id,
        event = %frame.event,
        code = e.code(),
        error = %e,
        "submission dropped"
      );
      match OutboundEvent::failure(&frame.room, conn_id, &e.to_failure(&frame.event)) {
        Ok(failure) => {
          state.hub.send_to(conn_id, failure.into()).await;
        }
        Err(e) => warn!(conn_id, error = %e, "cannot encode failure event"),
      }
    }
  }
}

/// Process a raw submission payload from connection `src`.
///
/// Either the whole object is persisted and the broadcast event returned, or
/// nothing is persisted and an error returned.
pub async fn ingest<S>(
  state: &AppState<S>,
  src: &str,
  payload: &[u8],
) -> Result<OutboundEvent>
where
  S: ObjectStore + 'static,
{
  let mut submission = Submission::from_slice(payload)?;
  let identity = Identity::generate();

  let stored_media = match submission.media.take() {
    Some(upload) => {
      let dir = state.config.uploads_dir.clone();
      let id = identity.id.clone();
      let stored =
        tokio::task::spawn_blocking(move || rtboard_media::ingest(&dir, &id, &upload))
          .await??;
      submission.record_media(stored.file_name.clone(), stored.dimensions.to_string());
      Some(stored)
    }
    None => None,
  };

  let post = match persist(state, Post::new(submission, &identity)).await {
    Ok(post) => post,
    Err(e) => {
      if let Some(media) = stored_media {
        let _ = tokio::fs::remove_file(&media.path).await;
      }
      return Err(e);
    }
  };

  OutboundEvent::broadcast(&post, src).map_err(Error::Encode)
}

async fn persist<S: ObjectStore>(state: &AppState<S>, post: Post) -> Result<Post> {
  match post {
    Post::Thread(thread) => {
      create_thread(&*state.store, &thread).await?;
      Ok(Post::Thread(thread))
    }
    Post::Reply(reply) => {
      let attempts = state.config.max_write_attempts.max(1);
      add_reply(&*state.store, reply, attempts).await.map(Post::Reply)
    }
    // Unknown kinds are broadcast but never stored.
    other => Ok(other),
  }
}

async fn create_thread<S: ObjectStore>(store: &S, thread: &Thread) -> Result<()> {
  let body = thread.to_json().map_err(Error::Encode)?;
  let created = store
    .compare_and_swap(&thread.topic, &thread.id, None, &body)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;
  match created {
    Some(_) => Ok(()),
    None => Err(Error::IdCollision(thread.id.clone())),
  }
}

/// Embed `reply` in its parent thread. Returns the reply as stored, which
/// differs from the input only if it tagged itself.
async fn add_reply<S: ObjectStore>(store: &S, reply: Reply, attempts: u32) -> Result<Reply> {
  let topic = reply.topic.clone();
  let thread_id = reply.thread_id.clone();

  for attempt in 1..=attempts {
    let Versioned { version, object } = store
      .get(&topic, &thread_id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or_else(|| Error::ThreadNotFound {
        topic:  topic.clone(),
        thread: thread_id.clone(),
      })?;

    let mut thread = Thread::from_json(object).map_err(Error::Encode)?;
    let links = attach_reply(&mut thread, reply.clone())
      .map_err(|DuplicateReply(id)| Error::IdCollision(id))?;
    let body = thread.to_json().map_err(Error::Encode)?;

    let written = store
      .compare_and_swap(&topic, &thread_id, Some(version), &body)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    if written.is_some() {
      if !links.ignored.is_empty() {
        debug!(reply = %reply.id, ignored = ?links.ignored, "unknown tags dropped");
      }
      return Ok(thread.replies.remove(&reply.id).unwrap_or(reply));
    }
    debug!(thread = %thread_id, attempt, "thread changed during reply; retrying");
  }

  Err(Error::WriteContention {
    thread: thread_id,
    attempts,
  })
}
