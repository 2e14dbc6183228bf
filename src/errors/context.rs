//! Shared store of currently active errors.
//!
//! `ErrorContext` is where every component reports failures and where the
//! notification UI reads them back. Dismissing an error here never touches
//! the [`ErrorLog`] history; logging and display are decoupled, but nothing
//! is displayed without being logged first.

use crate::errors::taxonomy::{AppError, ErrorKind};
use crate::logging::{ErrorLog, LogLevel};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const NOTIFICATION_BUFFER: usize = 64;

/// How long each notification class stays on screen.
pub const RECOVERABLE_NOTIFICATION_TTL: Duration = Duration::from_secs(4);
pub const FATAL_NOTIFICATION_TTL: Duration = Duration::from_secs(8);

/// A transient, toast-style message for the user.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Identity of the error this notification surfaces.
    pub error_id: Uuid,
    pub text: String,
    /// Dismiss-to-retry notifications are interactive; fatal ones are not.
    pub dismissible: bool,
    pub ttl: Duration,
}

impl Notification {
    fn for_error(error: &AppError) -> Self {
        if error.recoverable {
            Self {
                error_id: error.id,
                text: format!("{} Tap to retry.", error.message),
                dismissible: true,
                ttl: RECOVERABLE_NOTIFICATION_TTL,
            }
        } else {
            Self {
                error_id: error.id,
                text: error.message.clone(),
                dismissible: false,
                ttl: FATAL_NOTIFICATION_TTL,
            }
        }
    }
}

/// Clone-shareable handle over the active-error set.
#[derive(Clone)]
pub struct ErrorContext {
    active: Arc<RwLock<Vec<AppError>>>,
    notification_tx: Sender<Notification>,
    notification_rx: Receiver<Notification>,
    log: ErrorLog,
}

impl ErrorContext {
    pub fn new(log: ErrorLog) -> Self {
        let (notification_tx, notification_rx) = bounded(NOTIFICATION_BUFFER);
        Self {
            active: Arc::new(RwLock::new(Vec::new())),
            notification_tx,
            notification_rx,
            log,
        }
    }

    /// Receiver the notification UI drains.
    pub fn notifications(&self) -> Receiver<Notification> {
        self.notification_rx.clone()
    }

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    /// Insert into the active set, notify the user, and record in the log.
    pub fn add_error(&self, error: AppError) {
        self.log.log(
            LogLevel::Error,
            error.message.clone(),
            Some(serde_json::json!({
                "kind": error.kind,
                "recoverable": error.recoverable,
                "details": error.details.clone(),
            })),
            Some("error-context"),
        );

        // A full buffer drops the toast, not the error itself.
        let _ = self.notification_tx.try_send(Notification::for_error(&error));

        self.active.write().push(error);
    }

    /// Classify an arbitrary failure and report it. The catch-all entry
    /// point used at every component boundary.
    pub fn handle_error(&self, failure: impl std::fmt::Display, context: Option<&str>) -> AppError {
        let mut error = AppError::from_foreign(failure.to_string());
        if let Some(context) = context {
            error.message = format!("{} ({context})", error.message);
        }
        self.add_error(error.clone());
        error
    }

    /// Report a failure that is already typed.
    pub fn report(&self, kind: ErrorKind, details: impl Into<String>) -> AppError {
        let error = AppError::new(kind, kind.user_message()).with_details(details);
        self.add_error(error.clone());
        error
    }

    /// Dismiss one error by identity. Returns whether it was present.
    pub fn remove_error(&self, id: Uuid) -> bool {
        let mut active = self.active.write();
        let before = active.len();
        active.retain(|e| e.id != id);
        active.len() != before
    }

    /// Dismiss everything; returns how many were active.
    pub fn clear_errors(&self) -> usize {
        let mut active = self.active.write();
        let count = active.len();
        active.clear();
        count
    }

    /// Snapshot of the active set in insertion order.
    pub fn active(&self) -> Vec<AppError> {
        self.active.read().clone()
    }

    pub fn has_active(&self) -> bool {
        !self.active.read().is_empty()
    }
}
