//! Lifecycle manager for the remote widget.
//!
//! Owns the normalized [`WidgetState`], drains the host's event stream
//! through the pure reducer, and translates command failures and
//! widget-raised errors into [`ErrorContext`] reports. The manager never
//! removes the widget element; it only attaches and detaches listeners.

use crate::config::WidgetConfig;
use crate::errors::{ErrorContext, ErrorKind};
use crate::widget::host::WidgetHost;
use crate::widget::state::{reduce, WidgetEvent, WidgetState};
use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, warn};

pub struct WidgetLifecycleManager<H: WidgetHost> {
    host: H,
    events: Receiver<WidgetEvent>,
    state: WidgetState,
    errors: ErrorContext,
    config: WidgetConfig,
    mounted: bool,
    torn_down: bool,
}

impl<H: WidgetHost> WidgetLifecycleManager<H> {
    pub fn new(host: H, config: WidgetConfig, errors: ErrorContext) -> Self {
        let events = host.events();
        Self {
            host,
            events,
            state: WidgetState::default(),
            errors,
            config,
            mounted: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    fn apply(&mut self, event: WidgetEvent) {
        let next = reduce(self.state, &event);
        if next != self.state {
            debug!(?event, ?next, "widget state transition");
        }
        self.state = next;
    }

    /// Drain pending host events through the reducer. Widget-raised errors
    /// additionally produce one classified report in the error context.
    pub fn pump_events(&mut self) {
        if self.torn_down {
            // Stale completions after teardown are ignored.
            return;
        }
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    match &event {
                        WidgetEvent::ScriptFailed(reason) => {
                            self.errors.report(ErrorKind::WidgetInit, reason.clone());
                        }
                        WidgetEvent::Error(reason) => {
                            self.errors.handle_error(reason, Some("widget"));
                        }
                        _ => {}
                    }
                    self.apply(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("widget event channel disconnected");
                    break;
                }
            }
        }
    }

    /// Connect to the remote widget. Idempotent; returns whether the
    /// manager is connected afterwards.
    pub fn connect(&mut self) -> bool {
        if self.state.is_connected() {
            debug!("connect: already connected");
            return true;
        }

        let attributes = match self.config.attributes() {
            Some(attributes) => attributes,
            None => {
                self.errors
                    .report(ErrorKind::WidgetInit, "agent id is not configured");
                self.apply(WidgetEvent::Error("agent id is not configured".into()));
                return false;
            }
        };

        // Duplicate-script guard: an existing matching script tag means a
        // load is already underway or finished.
        if !self.host.script_present() {
            self.apply(WidgetEvent::ScriptInjected);
            self.host.inject_script(&self.config.script_url);
        }
        self.pump_events();

        if self.state.has_error() {
            return false;
        }

        if !self.host.element_present() {
            self.errors
                .report(ErrorKind::WidgetInit, "widget element not found in document");
            self.apply(WidgetEvent::Error("widget element not found".into()));
            return false;
        }

        if !self.mounted {
            self.host.mount(&attributes);
            self.mounted = true;
        }

        // Connecting succeeded; this also leaves any earlier error phase.
        self.apply(WidgetEvent::Connected);
        true
    }

    /// Always safe, from any state including `Idle`. Resets call flags;
    /// the element itself stays in the document.
    pub fn disconnect(&mut self) {
        if self.state.in_call {
            self.host.end_call();
        }
        self.apply(WidgetEvent::Disconnected);
    }

    /// Begin voice capture. Fails without throwing: `false` means nothing
    /// changed and the reason is already in the error context.
    pub fn start_voice_input(&mut self) -> bool {
        if !self.state.is_connected() {
            self.errors.report(
                ErrorKind::WidgetInit,
                "voice input requires an active connection",
            );
            return false;
        }
        if self.state.is_listening() {
            return true;
        }

        if let Err(refusal) = self.host.request_microphone() {
            self.errors.handle_error(refusal, Some("voice input"));
            return false;
        }

        self.apply(WidgetEvent::VoiceStarted);
        true
    }

    pub fn stop_voice_input(&mut self) {
        self.apply(WidgetEvent::VoiceStopped);
    }

    /// Toggle listening. When disconnected this fails fast with a widget
    /// initialization error instead of silently starting.
    pub fn toggle_voice_input(&mut self) -> bool {
        if !self.state.is_connected() {
            self.errors.report(
                ErrorKind::WidgetInit,
                "voice input requires an active connection",
            );
            return false;
        }
        if self.state.is_listening() {
            self.stop_voice_input();
            true
        } else {
            self.start_voice_input()
        }
    }

    /// Explicit user retry: leaves the sticky error phase back to `Idle`.
    pub fn clear_error(&mut self) {
        self.apply(WidgetEvent::ErrorCleared);
    }

    /// Best-effort teardown: end an active call, then remove listeners.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if self.state.in_call {
            self.host.end_call();
        }
        if self.mounted {
            self.host.detach();
            self.mounted = false;
        }
        self.torn_down = true;
    }
}

impl<H: WidgetHost> Drop for WidgetLifecycleManager<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
