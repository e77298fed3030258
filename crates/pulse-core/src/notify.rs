//! Notification events emitted as a side effect of a new like.
//!
//! Delivery and persistence belong to a separate subsystem; the engine only
//! hands events to a [`Notifier`] and never waits on the outcome.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::item::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  Like,
}

/// Emitted only when a like transitions `not-liked → liked` and the liker is
/// not the item's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
  #[serde(rename = "type")]
  pub kind:          NotificationKind,
  pub actor:         Uuid,
  pub target_author: Uuid,
  pub target_id:     Uuid,
  pub target_kind:   ItemKind,
}

/// Fire-and-forget sink for notification events.
pub trait Notifier: Send + Sync {
  fn notify(&self, event: NotificationEvent);
}

/// Writes each event to the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, event: NotificationEvent) {
    tracing::info!(
      actor = %event.actor,
      target_author = %event.target_author,
      target_id = %event.target_id,
      "like notification"
    );
  }
}

/// Forwards events to an unbounded channel drained by a delivery task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, event: NotificationEvent) {
    if let Err(e) = self.tx.send(event) {
      tracing::warn!(target_id = %e.0.target_id, "notification receiver closed; event dropped");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn event() -> NotificationEvent {
    NotificationEvent {
      kind:          NotificationKind::Like,
      actor:         Uuid::new_v4(),
      target_author: Uuid::new_v4(),
      target_id:     Uuid::new_v4(),
      target_kind:   ItemKind::Post,
    }
  }

  #[test]
  fn serialises_with_type_tag() {
    let json = serde_json::to_value(event()).unwrap();
    assert_eq!(json["type"], "like");
    assert_eq!(json["target_kind"], "post");
  }

  #[tokio::test]
  async fn channel_delivers_in_order() {
    let (notifier, mut rx) = ChannelNotifier::new();
    let a = event();
    let b = event();
    notifier.notify(a.clone());
    notifier.notify(b.clone());
    assert_eq!(rx.recv().await.unwrap(), a);
    assert_eq!(rx.recv().await.unwrap(), b);
  }

  #[test]
  fn closed_channel_is_not_an_error() {
    let (notifier, rx) = ChannelNotifier::new();
    drop(rx);
    notifier.notify(event());
  }
}
