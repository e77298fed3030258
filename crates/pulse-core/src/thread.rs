//! Reply threads: a post's flat reply list folded into a tree along
//! `parent_reply_id`.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::item::Item;

/// A reply and the replies nested directly under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyNode {
  #[serde(flatten)]
  pub reply:    Item,
  pub children: Vec<ReplyNode>,
}

/// Fold `replies` (oldest first) into a forest of top-level replies.
///
/// Sibling order follows input order. A reply whose parent is absent from
/// `replies` (for instance because the parent was moderated away) is dropped
/// along with its subtree.
pub fn build_reply_tree(replies: Vec<Item>) -> Vec<ReplyNode> {
  let mut roots = Vec::new();
  let mut by_parent: HashMap<Uuid, Vec<Item>> = HashMap::new();
  for reply in replies {
    match reply.parent_reply_id {
      Some(parent) => by_parent.entry(parent).or_default().push(reply),
      None => roots.push(reply),
    }
  }
  roots
    .into_iter()
    .map(|reply| attach(reply, &mut by_parent))
    .collect()
}

fn attach(reply: Item, by_parent: &mut HashMap<Uuid, Vec<Item>>) -> ReplyNode {
  let children = by_parent
    .remove(&reply.item_id)
    .unwrap_or_default()
    .into_iter()
    .map(|child| attach(child, by_parent))
    .collect();
  ReplyNode { reply, children }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::item::{ContentStatus, ItemKind};

  fn reply(post: Uuid, parent: Option<Uuid>, secs: i64) -> Item {
    Item {
      item_id:         Uuid::new_v4(),
      kind:            ItemKind::Reply,
      author_id:       Uuid::new_v4(),
      post_id:         Some(post),
      parent_reply_id: parent,
      body:            format!("r{secs}"),
      status:          ContentStatus::Active,
      created_at:      Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
      like_count:      0,
      reply_count:     0,
    }
  }

  #[test]
  fn nests_replies_under_their_parents() {
    let post = Uuid::new_v4();
    let a = reply(post, None, 1);
    let a1 = reply(post, Some(a.item_id), 2);
    let b = reply(post, None, 3);
    let a1x = reply(post, Some(a1.item_id), 4);
    let a2 = reply(post, Some(a.item_id), 5);

    let tree = build_reply_tree(vec![
      a.clone(),
      a1.clone(),
      b.clone(),
      a1x.clone(),
      a2.clone(),
    ]);

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].reply, a);
    assert_eq!(tree[1].reply, b);
    assert!(tree[1].children.is_empty());

    let under_a: Vec<_> = tree[0].children.iter().map(|n| n.reply.item_id).collect();
    assert_eq!(under_a, vec![a1.item_id, a2.item_id]);
    assert_eq!(tree[0].children[0].children[0].reply, a1x);
  }

  #[test]
  fn orphaned_subtrees_are_dropped() {
    let post = Uuid::new_v4();
    let hidden_parent = Uuid::new_v4();
    let top = reply(post, None, 1);
    let orphan = reply(post, Some(hidden_parent), 2);
    let orphan_child = reply(post, Some(orphan.item_id), 3);

    let tree = build_reply_tree(vec![top.clone(), orphan, orphan_child]);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].reply, top);
    assert!(tree[0].children.is_empty());
  }

  #[test]
  fn serialises_flat_item_fields_with_children() {
    let post = Uuid::new_v4();
    let top = reply(post, None, 1);
    let child = reply(post, Some(top.item_id), 2);
    let tree = build_reply_tree(vec![top.clone(), child.clone()]);

    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json[0]["item_id"], serde_json::json!(top.item_id));
    assert_eq!(json[0]["children"][0]["item_id"], serde_json::json!(child.item_id));
    assert_eq!(json[0]["children"][0]["children"], serde_json::json!([]));
  }
}
