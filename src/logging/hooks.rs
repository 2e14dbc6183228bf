//! Last-resort capture of failures that escape every component boundary.
//!
//! Rust routes escaped failures on any thread through the process panic
//! hook, so a single hook covers what a browser splits across
//! `window.onerror` and `unhandledrejection`. Installation happens at most
//! once per process; later calls are no-ops. The previously installed hook
//! is chained so default stderr reporting is preserved.

use crate::logging::{ErrorLog, LogLevel};
use std::sync::Once;

static INSTALL: Once = Once::new();

/// Context label stamped on entries produced by the hook.
pub const HOOK_CONTEXT: &str = "global-hook";

/// Install the process-wide panic hook that records an ERROR entry for
/// every escaped panic. Idempotent.
pub fn install_global_hooks(log: &ErrorLog) {
    let log = log.clone();
    INSTALL.call_once(move || {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic with non-string payload".to_string());

            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
            let thread = std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string();

            log.log(
                LogLevel::Error,
                format!("uncaught panic: {message}"),
                Some(serde_json::json!({
                    "location": location,
                    "thread": thread,
                })),
                Some(HOOK_CONTEXT),
            );

            previous(info);
        }));
    });
}
