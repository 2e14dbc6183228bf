//! Seam to the black-box remote widget.
//!
//! [`WidgetHost`] is everything the lifecycle manager is allowed to ask of
//! the surrounding host environment: script sentinel checks and injection,
//! element presence, microphone permission, and the element's event stream.
//! The real vendor element lives behind this trait; [`SimulatedHost`] is
//! the in-crate double used by the demo binary and the tests.

use crate::config::WidgetAttributes;
use crate::widget::state::WidgetEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

const EVENT_BUFFER: usize = 128;

pub trait WidgetHost: Send {
    /// Whether a matching vendor script tag already exists — the sentinel
    /// for "already loading or loaded".
    fn script_present(&self) -> bool;

    /// Inject the vendor script tag. Completion arrives later as a
    /// [`WidgetEvent::ScriptLoaded`] or [`WidgetEvent::ScriptFailed`].
    fn inject_script(&mut self, url: &str);

    /// Whether the widget element exists in the host document.
    fn element_present(&self) -> bool;

    /// Stamp attributes onto the element and attach event listeners.
    fn mount(&mut self, attributes: &WidgetAttributes);

    /// Ask the host for microphone access. `Err` carries the host's raw
    /// refusal message.
    fn request_microphone(&mut self) -> Result<(), String>;

    /// Best-effort end of any active call.
    fn end_call(&mut self);

    /// Remove all listeners attached by `mount`. The element itself stays;
    /// its lifetime belongs to the surrounding layout.
    fn detach(&mut self);

    /// Stream of events dispatched by the element and the script loader.
    fn events(&self) -> Receiver<WidgetEvent>;
}

#[derive(Debug, Clone)]
struct SimInner {
    script_present: bool,
    element_present: bool,
    script_loads_ok: bool,
    microphone_granted: bool,
    inject_count: usize,
    mount_count: usize,
    detach_count: usize,
    end_call_count: usize,
    mounted_attributes: Option<WidgetAttributes>,
}

impl Default for SimInner {
    fn default() -> Self {
        Self {
            script_present: false,
            element_present: true,
            script_loads_ok: true,
            microphone_granted: true,
            inject_count: 0,
            mount_count: 0,
            detach_count: 0,
            end_call_count: 0,
            mounted_attributes: None,
        }
    }
}

/// Scriptable host double. Cloneable handle: [`SimulatedHost::handle`]
/// feeds events and inspects interactions after the host has been moved
/// into a manager.
pub struct SimulatedHost {
    inner: Arc<Mutex<SimInner>>,
    event_tx: Sender<WidgetEvent>,
    event_rx: Receiver<WidgetEvent>,
}

/// Inspection/feeder handle onto a [`SimulatedHost`].
#[derive(Clone)]
pub struct SimulatedHostHandle {
    inner: Arc<Mutex<SimInner>>,
    event_tx: Sender<WidgetEvent>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        Self {
            inner: Arc::new(Mutex::new(SimInner::default())),
            event_tx,
            event_rx,
        }
    }

    pub fn handle(&self) -> SimulatedHostHandle {
        SimulatedHostHandle {
            inner: Arc::clone(&self.inner),
            event_tx: self.event_tx.clone(),
        }
    }

    /// Pretend the vendor script tag is already in the document.
    pub fn with_script_present(self) -> Self {
        self.inner.lock().script_present = true;
        self
    }

    /// Make the next script injection fail.
    pub fn fail_script_load(self) -> Self {
        self.inner.lock().script_loads_ok = false;
        self
    }

    /// Remove the widget element from the simulated document.
    pub fn without_element(self) -> Self {
        self.inner.lock().element_present = false;
        self
    }

    /// Deny microphone permission requests.
    pub fn deny_microphone(self) -> Self {
        self.inner.lock().microphone_granted = false;
        self
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetHost for SimulatedHost {
    fn script_present(&self) -> bool {
        self.inner.lock().script_present
    }

    fn inject_script(&mut self, _url: &str) {
        let mut inner = self.inner.lock();
        inner.inject_count += 1;
        inner.script_present = true;
        let event = if inner.script_loads_ok {
            WidgetEvent::ScriptLoaded
        } else {
            WidgetEvent::ScriptFailed("script load failed".to_string())
        };
        drop(inner);
        let _ = self.event_tx.try_send(event);
    }

    fn element_present(&self) -> bool {
        self.inner.lock().element_present
    }

    fn mount(&mut self, attributes: &WidgetAttributes) {
        let mut inner = self.inner.lock();
        inner.mount_count += 1;
        inner.mounted_attributes = Some(attributes.clone());
    }

    fn request_microphone(&mut self) -> Result<(), String> {
        if self.inner.lock().microphone_granted {
            Ok(())
        } else {
            Err("NotAllowedError: microphone permission denied".to_string())
        }
    }

    fn end_call(&mut self) {
        self.inner.lock().end_call_count += 1;
    }

    fn detach(&mut self) {
        self.inner.lock().detach_count += 1;
    }

    fn events(&self) -> Receiver<WidgetEvent> {
        self.event_rx.clone()
    }
}

impl SimulatedHostHandle {
    /// Dispatch an event as if the remote element raised it.
    pub fn dispatch(&self, event: WidgetEvent) {
        let _ = self.event_tx.try_send(event);
    }

    pub fn inject_count(&self) -> usize {
        self.inner.lock().inject_count
    }

    pub fn mount_count(&self) -> usize {
        self.inner.lock().mount_count
    }

    pub fn detach_count(&self) -> usize {
        self.inner.lock().detach_count
    }

    pub fn end_call_count(&self) -> usize {
        self.inner.lock().end_call_count
    }

    pub fn mounted_attributes(&self) -> Option<WidgetAttributes> {
        self.inner.lock().mounted_attributes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_sets_sentinel_and_emits_loaded() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        let rx = host.events();

        assert!(!host.script_present());
        host.inject_script("https://example.invalid/widget.js");

        assert!(host.script_present());
        assert_eq!(handle.inject_count(), 1);
        assert_eq!(rx.try_recv().unwrap(), WidgetEvent::ScriptLoaded);
    }

    #[test]
    fn test_failing_script_load() {
        let mut host = SimulatedHost::new().fail_script_load();
        let rx = host.events();
        host.inject_script("https://example.invalid/widget.js");
        assert!(matches!(
            rx.try_recv().unwrap(),
            WidgetEvent::ScriptFailed(_)
        ));
    }

    #[test]
    fn test_microphone_denial_message_classifies() {
        let mut host = SimulatedHost::new().deny_microphone();
        let err = host.request_microphone().unwrap_err();
        assert_eq!(
            crate::errors::ErrorKind::classify(&err),
            crate::errors::ErrorKind::MicrophoneAccessDenied
        );
    }
}
