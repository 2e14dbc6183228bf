//! Request/response abstraction for assistant replies.
//!
//! [`AssistantBackend`] hides where replies come from; a real
//! network-backed implementation can replace [`SimulatedBackend`] without
//! touching the controller. Requests carry an id, replies echo it, and a
//! request can be cancelled while in flight — a cancelled request's reply
//! is simply never delivered.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const REPLY_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub enum ReplyEvent {
    Reply { request_id: Uuid, text: String },
    Failed { request_id: Uuid, error: String },
}

impl ReplyEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            ReplyEvent::Reply { request_id, .. } | ReplyEvent::Failed { request_id, .. } => {
                *request_id
            }
        }
    }
}

pub trait AssistantBackend: Send {
    /// Issue a reply request. The result arrives on [`events`].
    fn request_reply(&mut self, prompt: &str, request_id: Uuid);

    /// Cancel an in-flight request; its reply will not be delivered.
    fn cancel(&mut self, request_id: Uuid);

    fn events(&self) -> Receiver<ReplyEvent>;
}

/// Delayed canned-reply backend. Each request runs on its own timer
/// thread; cancellation is checked after the delay so a cancelled reply
/// never reaches the channel.
pub struct SimulatedBackend {
    delay: Duration,
    cancelled: Arc<Mutex<HashSet<Uuid>>>,
    event_tx: Sender<ReplyEvent>,
    event_rx: Receiver<ReplyEvent>,
    /// When set, every request fails with this message instead.
    failure: Option<String>,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        let (event_tx, event_rx) = bounded(REPLY_BUFFER);
        Self {
            delay,
            cancelled: Arc::new(Mutex::new(HashSet::new())),
            event_tx,
            event_rx,
            failure: None,
        }
    }

    /// Make every subsequent request fail with the given message.
    pub fn failing_with(mut self, error: impl Into<String>) -> Self {
        self.failure = Some(error.into());
        self
    }

    fn compose_reply(prompt: &str) -> String {
        format!("You said: \"{}\". How can I help further?", prompt.trim())
    }
}

impl AssistantBackend for SimulatedBackend {
    fn request_reply(&mut self, prompt: &str, request_id: Uuid) {
        let delay = self.delay;
        let cancelled = Arc::clone(&self.cancelled);
        let event_tx = self.event_tx.clone();
        let failure = self.failure.clone();
        let prompt = prompt.to_string();

        std::thread::spawn(move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            if cancelled.lock().remove(&request_id) {
                debug!(%request_id, "reply request cancelled, dropping result");
                return;
            }
            let event = match failure {
                Some(error) => ReplyEvent::Failed { request_id, error },
                None => ReplyEvent::Reply {
                    request_id,
                    text: Self::compose_reply(&prompt),
                },
            };
            let _ = event_tx.try_send(event);
        });
    }

    fn cancel(&mut self, request_id: Uuid) {
        self.cancelled.lock().insert(request_id);
    }

    fn events(&self) -> Receiver<ReplyEvent> {
        self.event_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_reply_arrives() {
        let mut backend = SimulatedBackend::new(Duration::ZERO);
        let rx = backend.events();
        let id = Uuid::new_v4();
        backend.request_reply("hello", id);

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        match event {
            ReplyEvent::Reply { request_id, text } => {
                assert_eq!(request_id, id);
                assert!(text.contains("hello"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_failure_mode() {
        let mut backend = SimulatedBackend::new(Duration::ZERO).failing_with("network down");
        let rx = backend.events();
        let id = Uuid::new_v4();
        backend.request_reply("hello", id);

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, ReplyEvent::Failed { request_id, .. } if request_id == id));
    }

    #[test]
    fn test_cancel_suppresses_reply() {
        let mut backend = SimulatedBackend::new(Duration::from_millis(50));
        let rx = backend.events();
        let id = Uuid::new_v4();
        backend.request_reply("hello", id);
        backend.cancel(id);

        // Wait out the delay with margin; nothing should arrive.
        let deadline = Instant::now() + Duration::from_millis(300);
        while Instant::now() < deadline {
            assert!(rx.try_recv().is_err());
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}
