use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Text,
    Voice,
}

/// Delivery status of a message. `Sending` may move to `Sent` or `Error`;
/// nothing else transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub modality: Modality,
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl ConversationMessage {
    pub fn new(sender: Sender, modality: Modality, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            modality,
            timestamp: Utc::now(),
            status: DeliveryStatus::Sending,
        }
    }

    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        self.status = status;
        self
    }
}
