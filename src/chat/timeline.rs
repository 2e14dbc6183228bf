//! Ordered conversation timeline.
//!
//! Insertion order is conversation order. Messages are never reordered or
//! removed individually; only `reset` empties the timeline.

use super::types::{ConversationMessage, DeliveryStatus};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Timeline {
    messages: Arc<RwLock<Vec<ConversationMessage>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn push(&self, message: ConversationMessage) -> Uuid {
        let id = message.id;
        self.messages.write().push(message);
        id
    }

    /// Transition one message's delivery status. Returns whether the
    /// message was found.
    pub fn set_status(&self, id: Uuid, status: DeliveryStatus) -> bool {
        let mut messages = self.messages.write();
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> Vec<ConversationMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Full conversation reset.
    pub fn reset(&self) {
        self.messages.write().clear();
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{Modality, Sender};

    #[test]
    fn test_insertion_order_preserved() {
        let timeline = Timeline::new();
        timeline.push(ConversationMessage::new(Sender::User, Modality::Text, "a"));
        timeline.push(ConversationMessage::new(
            Sender::Assistant,
            Modality::Text,
            "b",
        ));

        let all = timeline.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "a");
        assert_eq!(all[1].text, "b");
    }

    #[test]
    fn test_status_transition() {
        let timeline = Timeline::new();
        let id = timeline.push(ConversationMessage::new(
            Sender::User,
            Modality::Text,
            "hi",
        ));

        assert!(timeline.set_status(id, DeliveryStatus::Sent));
        assert_eq!(timeline.all()[0].status, DeliveryStatus::Sent);
        assert!(!timeline.set_status(Uuid::new_v4(), DeliveryStatus::Sent));
    }

    #[test]
    fn test_reset() {
        let timeline = Timeline::new();
        timeline.push(ConversationMessage::new(Sender::User, Modality::Text, "x"));
        timeline.reset();
        assert!(timeline.is_empty());
    }
}
