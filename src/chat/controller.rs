//! Conversation orchestration.
//!
//! `ChatController` serializes user intents into the right downstream call
//! (text send vs. voice toggle), assembles the unified timeline from local
//! text messages plus assistant replies, and derives the single status
//! label the UI displays.

use crate::chat::responder::{AssistantBackend, ReplyEvent};
use crate::chat::timeline::Timeline;
use crate::chat::types::{ConversationMessage, DeliveryStatus, Modality, Sender};
use crate::errors::ErrorContext;
use crate::widget::{WidgetHost, WidgetLifecycleManager};
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Keys the chat surface intercepts at the document level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Space,
}

/// One intercepted keystroke plus the context needed to route it.
#[derive(Debug, Clone, Copy)]
pub struct KeyInput {
    pub key: Key,
    /// Platform send modifier (Ctrl/Cmd) held.
    pub modifier: bool,
    /// Whether focus is inside a text field; Space must not hijack typing.
    pub in_text_field: bool,
}

/// Display status, derived by priority: an error always dominates
/// transient busy-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Error,
    Speaking,
    Listening,
    Sending,
    Connected,
    Idle,
}

impl ChatStatus {
    pub fn label(self) -> &'static str {
        match self {
            ChatStatus::Error => "Something went wrong",
            ChatStatus::Speaking => "Assistant is speaking",
            ChatStatus::Listening => "Listening",
            ChatStatus::Sending => "Sending",
            ChatStatus::Connected => "Connected",
            ChatStatus::Idle => "Ready",
        }
    }
}

pub struct ChatController<H: WidgetHost, B: AssistantBackend> {
    widget: WidgetLifecycleManager<H>,
    backend: B,
    replies: Receiver<ReplyEvent>,
    timeline: Timeline,
    errors: ErrorContext,
    input: String,
    /// Replies still in flight: request id to the user message awaiting
    /// its status transition. Each send resolves independently.
    in_flight: HashMap<Uuid, Uuid>,
}

impl<H: WidgetHost, B: AssistantBackend> ChatController<H, B> {
    pub fn new(widget: WidgetLifecycleManager<H>, backend: B, errors: ErrorContext) -> Self {
        let replies = backend.events();
        Self {
            widget,
            backend,
            replies,
            timeline: Timeline::new(),
            errors,
            input: String::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn widget(&self) -> &WidgetLifecycleManager<H> {
        &self.widget
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn connect(&mut self) -> bool {
        self.widget.connect()
    }

    /// Disconnect and cancel any reply still in flight.
    pub fn disconnect(&mut self) {
        self.cancel_pending();
        self.widget.disconnect();
    }

    pub fn toggle_voice_input(&mut self) -> bool {
        self.widget.toggle_voice_input()
    }

    /// Send a text message. Empty or whitespace-only content is a silent
    /// no-op. The input buffer is cleared once the message is accepted.
    pub fn send_text(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }

        let message = ConversationMessage::new(Sender::User, Modality::Text, content);
        let user_message_id = self.timeline.push(message);
        self.input.clear();

        let request_id = Uuid::new_v4();
        self.backend.request_reply(content, request_id);
        self.in_flight.insert(request_id, user_message_id);
    }

    /// Send whatever is in the input buffer.
    pub fn send_current_input(&mut self) {
        let content = self.input.clone();
        self.send_text(&content);
    }

    /// Drain widget and backend events. Call from the driver loop.
    pub fn poll_events(&mut self) {
        self.widget.pump_events();

        while let Ok(event) = self.replies.try_recv() {
            let Some(user_message_id) = self.in_flight.remove(&event.request_id()) else {
                // Stale reply from before a reset or disconnect.
                debug!(request_id = %event.request_id(), "stale reply, dropping");
                continue;
            };

            match event {
                ReplyEvent::Reply { text, .. } => {
                    self.timeline.set_status(user_message_id, DeliveryStatus::Sent);
                    self.timeline.push(
                        ConversationMessage::new(Sender::Assistant, Modality::Text, text)
                            .with_status(DeliveryStatus::Sent),
                    );
                }
                ReplyEvent::Failed { error, .. } => {
                    self.timeline
                        .set_status(user_message_id, DeliveryStatus::Error);
                    self.errors.handle_error(error, Some("assistant reply"));
                }
            }
        }
    }

    /// Keyboard command mapping for the mounted chat surface.
    pub fn handle_key(&mut self, input: KeyInput) {
        match input.key {
            Key::Enter if input.modifier => self.send_current_input(),
            Key::Escape => {
                if self.widget.state().is_listening() {
                    // Cancel the voice session; unsent text survives.
                    self.widget.stop_voice_input();
                } else {
                    self.input.clear();
                }
            }
            Key::Space if !input.in_text_field => {
                self.toggle_voice_input();
            }
            _ => {}
        }
    }

    /// First matching condition wins; the order is deliberate product
    /// behavior and must not be rearranged.
    pub fn status(&self) -> ChatStatus {
        let state = self.widget.state();
        if self.errors.has_active() || state.has_error() {
            ChatStatus::Error
        } else if state.is_speaking() {
            ChatStatus::Speaking
        } else if state.is_listening() {
            ChatStatus::Listening
        } else if !self.in_flight.is_empty() {
            ChatStatus::Sending
        } else if state.is_connected() {
            ChatStatus::Connected
        } else {
            ChatStatus::Idle
        }
    }

    fn cancel_pending(&mut self) {
        for (request_id, _) in self.in_flight.drain() {
            self.backend.cancel(request_id);
        }
    }

    /// Full conversation reset: pending reply cancelled, timeline emptied,
    /// input cleared.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.timeline.reset();
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::responder::SimulatedBackend;
    use crate::config::{Environment, WidgetConfig};
    use crate::logging::ErrorLog;
    use crate::widget::SimulatedHost;
    use std::time::{Duration, Instant};

    type TestController = ChatController<SimulatedHost, SimulatedBackend>;

    fn controller_with(backend: SimulatedBackend) -> (TestController, ErrorContext) {
        let errors = ErrorContext::new(ErrorLog::new(Environment::Development));
        let config = WidgetConfig::default().with_agent_id("agent-test");
        let widget = WidgetLifecycleManager::new(SimulatedHost::new(), config, errors.clone());
        (ChatController::new(widget, backend, errors.clone()), errors)
    }

    fn controller() -> (TestController, ErrorContext) {
        controller_with(SimulatedBackend::new(Duration::ZERO))
    }

    fn poll_until<F: Fn(&TestController) -> bool>(ctl: &mut TestController, done: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done(ctl) {
            assert!(Instant::now() < deadline, "condition not reached in time");
            ctl.poll_events();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_send_hello_builds_two_message_timeline() {
        let (mut ctl, _) = controller();
        ctl.connect();
        ctl.send_text("Hello");

        let all = ctl.timeline().all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sender, Sender::User);
        assert_eq!(all[0].modality, Modality::Text);
        assert_eq!(all[0].status, DeliveryStatus::Sending);

        poll_until(&mut ctl, |c| c.timeline().len() == 2);

        let all = ctl.timeline().all();
        assert_eq!(all[0].status, DeliveryStatus::Sent);
        assert_eq!(all[1].sender, Sender::Assistant);
        assert_eq!(all[1].status, DeliveryStatus::Sent);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_rapid_second_send_resolves_both_exchanges() {
        let (mut ctl, errors) =
            controller_with(SimulatedBackend::new(Duration::from_millis(30)));
        ctl.connect();

        // Second send goes out before the first reply lands.
        ctl.send_text("first");
        ctl.send_text("second");
        assert_eq!(ctl.status(), ChatStatus::Sending);

        poll_until(&mut ctl, |c| c.timeline().len() == 4);

        let all = ctl.timeline().all();
        let users: Vec<_> = all.iter().filter(|m| m.sender == Sender::User).collect();
        assert_eq!(users.len(), 2);
        // Neither user message is stuck in Sending.
        assert!(users.iter().all(|m| m.status == DeliveryStatus::Sent));

        let replies: Vec<_> = all
            .iter()
            .filter(|m| m.sender == Sender::Assistant)
            .collect();
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().any(|m| m.text.contains("first")));
        assert!(replies.iter().any(|m| m.text.contains("second")));

        assert!(errors.active().is_empty());
        assert_eq!(ctl.status(), ChatStatus::Connected);
    }

    #[test]
    fn test_whitespace_only_send_is_noop() {
        let (mut ctl, _) = controller();
        ctl.send_text("   \n\t ");
        assert!(ctl.timeline().is_empty());
        assert_eq!(ctl.status(), ChatStatus::Idle);
    }

    #[test]
    fn test_send_clears_input_buffer() {
        let (mut ctl, _) = controller();
        ctl.set_input("Hello there");
        ctl.send_current_input();
        assert!(ctl.input().is_empty());
        assert_eq!(ctl.timeline().len(), 1);
    }

    #[test]
    fn test_failed_reply_marks_user_message_error() {
        let (mut ctl, errors) =
            controller_with(SimulatedBackend::new(Duration::ZERO).failing_with("fetch failed"));
        ctl.send_text("Hello");

        poll_until(&mut ctl, |c| {
            c.timeline().all()[0].status == DeliveryStatus::Error
        });
        assert_eq!(ctl.timeline().len(), 1);
        assert_eq!(errors.active().len(), 1);
        assert_eq!(ctl.status(), ChatStatus::Error);
    }

    #[test]
    fn test_modifier_enter_sends() {
        let (mut ctl, _) = controller();
        ctl.set_input("Hi");
        ctl.handle_key(KeyInput {
            key: Key::Enter,
            modifier: true,
            in_text_field: true,
        });
        assert_eq!(ctl.timeline().len(), 1);

        // Plain Enter does nothing.
        ctl.set_input("again");
        ctl.handle_key(KeyInput {
            key: Key::Enter,
            modifier: false,
            in_text_field: true,
        });
        assert_eq!(ctl.timeline().len(), 1);
    }

    #[test]
    fn test_escape_two_stage_behavior() {
        let (mut ctl, _) = controller();
        ctl.connect();
        ctl.toggle_voice_input();
        assert!(ctl.widget().state().is_listening());

        ctl.set_input("draft text");
        ctl.handle_key(KeyInput {
            key: Key::Escape,
            modifier: false,
            in_text_field: false,
        });
        // First press stops voice, leaves the draft alone.
        assert!(!ctl.widget().state().is_listening());
        assert_eq!(ctl.input(), "draft text");

        ctl.handle_key(KeyInput {
            key: Key::Escape,
            modifier: false,
            in_text_field: false,
        });
        assert!(ctl.input().is_empty());
    }

    #[test]
    fn test_space_toggles_voice_outside_text_field_only() {
        let (mut ctl, _) = controller();
        ctl.connect();

        ctl.handle_key(KeyInput {
            key: Key::Space,
            modifier: false,
            in_text_field: true,
        });
        assert!(!ctl.widget().state().is_listening());

        ctl.handle_key(KeyInput {
            key: Key::Space,
            modifier: false,
            in_text_field: false,
        });
        assert!(ctl.widget().state().is_listening());
    }

    #[test]
    fn test_status_priority_order() {
        let (mut ctl, errors) = controller();
        assert_eq!(ctl.status(), ChatStatus::Idle);

        ctl.connect();
        assert_eq!(ctl.status(), ChatStatus::Connected);

        ctl.send_text("Hello");
        assert_eq!(ctl.status(), ChatStatus::Sending);

        ctl.toggle_voice_input();
        // Listening outranks sending.
        assert_eq!(ctl.status(), ChatStatus::Listening);

        // An error outranks everything.
        errors.report(crate::errors::ErrorKind::Network, "offline");
        assert_eq!(ctl.status(), ChatStatus::Error);

        errors.clear_errors();
        ctl.widget.stop_voice_input();
        poll_until(&mut ctl, |c| c.timeline().len() == 2);
        assert_eq!(ctl.status(), ChatStatus::Connected);
    }

    #[test]
    fn test_disconnect_cancels_pending_reply() {
        let (mut ctl, _) = controller_with(SimulatedBackend::new(Duration::from_millis(30)));
        ctl.connect();
        ctl.send_text("Hello");
        ctl.disconnect();

        // Give the cancelled timer time to fire anyway.
        std::thread::sleep(Duration::from_millis(150));
        ctl.poll_events();

        assert_eq!(ctl.timeline().len(), 1);
        assert_eq!(ctl.timeline().all()[0].status, DeliveryStatus::Sending);
        assert_ne!(ctl.status(), ChatStatus::Sending);
    }

    #[test]
    fn test_reset_empties_conversation() {
        let (mut ctl, _) = controller();
        ctl.send_text("Hello");
        ctl.set_input("draft");
        ctl.reset();

        assert!(ctl.timeline().is_empty());
        assert!(ctl.input().is_empty());
        assert_ne!(ctl.status(), ChatStatus::Sending);
    }

    #[test]
    fn test_stale_reply_after_reset_is_dropped() {
        let (mut ctl, _) = controller_with(SimulatedBackend::new(Duration::ZERO));
        ctl.send_text("first");
        // Let the reply land in the channel, then reset before polling.
        std::thread::sleep(Duration::from_millis(100));
        ctl.reset();

        ctl.send_text("second");
        poll_until(&mut ctl, |c| c.timeline().len() == 2);

        let all = ctl.timeline().all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "second");
        assert!(all[1].text.contains("second"));
    }
}
