//! Connection state machine for the remote widget.
//!
//! All transitions flow through a single pure [`reduce`] function over a
//! typed event union, so the machine is testable without a live widget.
//! The error phase is sticky: only an explicit [`WidgetEvent::ErrorCleared`]
//! leaves it, back to `Idle`.

use serde::{Deserialize, Serialize};

/// Primary connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPhase {
    /// Nothing loaded yet.
    Idle,
    /// Vendor script injected, element not yet usable.
    Connecting,
    /// Script loaded and element constructible; no active connection.
    Ready,
    Connected,
    Error,
}

impl Default for WidgetPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// What the active call is doing. A single enum keeps listening and
/// speaking mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceActivity {
    Inactive,
    Listening,
    Speaking,
}

impl Default for VoiceActivity {
    fn default() -> Self {
        Self::Inactive
    }
}

/// Everything the remote widget or the local commands can signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Vendor script tag was just injected; a load is underway.
    ScriptInjected,
    /// Vendor script finished loading.
    ScriptLoaded,
    /// Vendor script failed to load.
    ScriptFailed(String),
    /// Element dispatched its `connect` event.
    Connected,
    /// Element dispatched its `disconnect` event.
    Disconnected,
    /// Element dispatched its `call` event; a conversation is live.
    CallStarted,
    /// Element dispatched its `error` event.
    Error(String),
    /// Local voice-input commands, routed through the reducer so there is
    /// exactly one transition function.
    VoiceStarted,
    VoiceStopped,
    /// Widget started speaking a reply.
    SpeakingStarted,
    SpeakingStopped,
    /// Explicit user retry after an error.
    ErrorCleared,
}

/// The full normalized widget state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WidgetState {
    pub phase: WidgetPhase,
    pub activity: VoiceActivity,
    pub in_call: bool,
}

impl WidgetState {
    pub fn is_connected(&self) -> bool {
        self.phase == WidgetPhase::Connected
    }

    pub fn is_listening(&self) -> bool {
        self.activity == VoiceActivity::Listening
    }

    pub fn is_speaking(&self) -> bool {
        self.activity == VoiceActivity::Speaking
    }

    pub fn has_error(&self) -> bool {
        self.phase == WidgetPhase::Error
    }
}

/// The single transition function: `(state, event) -> state`.
pub fn reduce(state: WidgetState, event: &WidgetEvent) -> WidgetState {
    match event {
        WidgetEvent::ScriptInjected => WidgetState {
            phase: match state.phase {
                WidgetPhase::Idle => WidgetPhase::Connecting,
                other => other,
            },
            ..state
        },
        WidgetEvent::ScriptLoaded => WidgetState {
            phase: match state.phase {
                WidgetPhase::Idle | WidgetPhase::Connecting => WidgetPhase::Ready,
                other => other,
            },
            ..state
        },
        WidgetEvent::ScriptFailed(_) | WidgetEvent::Error(_) => WidgetState {
            phase: WidgetPhase::Error,
            activity: VoiceActivity::Inactive,
            in_call: false,
        },
        WidgetEvent::Connected => WidgetState {
            phase: WidgetPhase::Connected,
            ..state
        },
        WidgetEvent::Disconnected => WidgetState {
            phase: match state.phase {
                // Disconnecting before the script is loaded (or after an
                // error) does not promote the phase to Ready.
                WidgetPhase::Error => WidgetPhase::Error,
                WidgetPhase::Idle => WidgetPhase::Idle,
                WidgetPhase::Connecting => WidgetPhase::Connecting,
                _ => WidgetPhase::Ready,
            },
            activity: VoiceActivity::Inactive,
            in_call: false,
        },
        WidgetEvent::CallStarted => WidgetState {
            in_call: true,
            ..state
        },
        WidgetEvent::VoiceStarted => WidgetState {
            // Listening displaces speaking; they are never simultaneous.
            activity: VoiceActivity::Listening,
            ..state
        },
        WidgetEvent::VoiceStopped => WidgetState {
            activity: match state.activity {
                VoiceActivity::Listening => VoiceActivity::Inactive,
                other => other,
            },
            ..state
        },
        WidgetEvent::SpeakingStarted => WidgetState {
            activity: VoiceActivity::Speaking,
            ..state
        },
        WidgetEvent::SpeakingStopped => WidgetState {
            activity: match state.activity {
                VoiceActivity::Speaking => VoiceActivity::Inactive,
                other => other,
            },
            ..state
        },
        WidgetEvent::ErrorCleared => WidgetState {
            phase: match state.phase {
                WidgetPhase::Error => WidgetPhase::Idle,
                other => other,
            },
            ..state
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(events: &[WidgetEvent]) -> WidgetState {
        events
            .iter()
            .fold(WidgetState::default(), |s, e| reduce(s, e))
    }

    #[test]
    fn test_happy_path_to_connected() {
        let state = apply(&[WidgetEvent::ScriptLoaded, WidgetEvent::Connected]);
        assert_eq!(state.phase, WidgetPhase::Connected);
        assert!(!state.in_call);
    }

    #[test]
    fn test_script_injection_enters_connecting() {
        let state = reduce(WidgetState::default(), &WidgetEvent::ScriptInjected);
        assert_eq!(state.phase, WidgetPhase::Connecting);

        // Injection noticed after the load already completed is a no-op.
        let ready = apply(&[WidgetEvent::ScriptInjected, WidgetEvent::ScriptLoaded]);
        assert_eq!(reduce(ready, &WidgetEvent::ScriptInjected).phase, WidgetPhase::Ready);
    }

    #[test]
    fn test_script_failure_enters_error() {
        let state = apply(&[WidgetEvent::ScriptFailed("404".into())]);
        assert_eq!(state.phase, WidgetPhase::Error);
    }

    #[test]
    fn test_disconnect_clears_call_flags() {
        let state = apply(&[
            WidgetEvent::ScriptLoaded,
            WidgetEvent::Connected,
            WidgetEvent::CallStarted,
            WidgetEvent::VoiceStarted,
            WidgetEvent::Disconnected,
        ]);
        assert_eq!(state.phase, WidgetPhase::Ready);
        assert!(!state.in_call);
        assert_eq!(state.activity, VoiceActivity::Inactive);
    }

    #[test]
    fn test_widget_error_clears_call_state() {
        let state = apply(&[
            WidgetEvent::ScriptLoaded,
            WidgetEvent::Connected,
            WidgetEvent::CallStarted,
            WidgetEvent::VoiceStarted,
            WidgetEvent::Error("dropped".into()),
        ]);
        assert_eq!(state.phase, WidgetPhase::Error);
        assert!(!state.in_call);
        assert!(!state.is_listening());
        assert!(!state.is_speaking());
    }

    #[test]
    fn test_disconnect_from_idle_stays_idle() {
        let state = reduce(WidgetState::default(), &WidgetEvent::Disconnected);
        assert_eq!(state.phase, WidgetPhase::Idle);
        assert!(!state.in_call);
        assert_eq!(state.activity, VoiceActivity::Inactive);
    }

    #[test]
    fn test_error_is_not_self_healing() {
        let errored = apply(&[WidgetEvent::Error("x".into())]);
        // Later benign events do not leave the error phase.
        let still = reduce(errored, &WidgetEvent::Disconnected);
        assert_eq!(still.phase, WidgetPhase::Error);

        let cleared = reduce(still, &WidgetEvent::ErrorCleared);
        assert_eq!(cleared.phase, WidgetPhase::Idle);
    }

    #[test]
    fn test_listening_and_speaking_exclusive() {
        let state = apply(&[
            WidgetEvent::ScriptLoaded,
            WidgetEvent::Connected,
            WidgetEvent::SpeakingStarted,
            WidgetEvent::VoiceStarted,
        ]);
        assert!(state.is_listening());
        assert!(!state.is_speaking());

        let state = reduce(state, &WidgetEvent::SpeakingStarted);
        assert!(state.is_speaking());
        assert!(!state.is_listening());
    }

    #[test]
    fn test_voice_toggle_round_trip() {
        let connected = apply(&[WidgetEvent::ScriptLoaded, WidgetEvent::Connected]);
        let listening = reduce(connected, &WidgetEvent::VoiceStarted);
        let back = reduce(listening, &WidgetEvent::VoiceStopped);
        assert_eq!(back.activity, connected.activity);
    }

    #[test]
    fn test_stop_voice_does_not_interrupt_speaking() {
        let state = apply(&[
            WidgetEvent::ScriptLoaded,
            WidgetEvent::Connected,
            WidgetEvent::SpeakingStarted,
            WidgetEvent::VoiceStopped,
        ]);
        assert!(state.is_speaking());
    }
}
