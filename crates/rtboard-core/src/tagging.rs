//! Backlink maintenance between a reply and the posts it tags.

use crate::post::{Reply, Thread};

/// What [`attach_reply`] did with each entry of the reply's `tagging` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backlinks {
  /// The reply tagged the thread itself.
  pub thread:  bool,
  /// Sibling replies (possibly the new reply itself) that gained a backlink.
  pub replies: Vec<String>,
  /// Tags that matched nothing in the thread and were dropped.
  pub ignored: Vec<String>,
}

/// The reply id is already present in the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReply(pub String);

/// Insert `reply` into `thread` and record its backlinks.
///
/// Tags are visited in the reply's order. A tag equal to the thread id appends
/// to the thread's `tagged_by`; a tag naming a reply in the thread (the new one
/// included) appends to that reply's `tagged_by`; anything else is ignored.
/// Nothing is modified when the reply id already exists.
pub fn attach_reply(
  thread: &mut Thread,
  reply: Reply,
) -> Result<Backlinks, DuplicateReply> {
  if thread.replies.contains_key(&reply.id) {
    return Err(DuplicateReply(reply.id));
  }

  let reply_id = reply.id.clone();
  let tags = reply.tagging.clone();
  thread.replies.insert(reply_id.clone(), reply);

  let mut links = Backlinks::default();
  for tag in tags {
    if tag == thread.id {
      thread.tagged_by.push(reply_id.clone());
      links.thread = true;
    } else if let Some(target) = thread.replies.get_mut(&tag) {
      target.tagged_by.push(reply_id.clone());
      links.replies.push(tag);
    } else {
      links.ignored.push(tag);
    }
  }
  Ok(links)
}
