pub mod controller;
pub mod responder;
pub mod timeline;
pub mod types;

pub use controller::{ChatController, ChatStatus, Key, KeyInput};
pub use responder::{AssistantBackend, ReplyEvent, SimulatedBackend};
pub use timeline::Timeline;
pub use types::{ConversationMessage, DeliveryStatus, Modality, Sender};
