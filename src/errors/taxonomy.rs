//! The closed set of error kinds and typed error construction.
//!
//! Every failure observed anywhere in the core is coerced into one of
//! these kinds before it is stored or shown. Classification of foreign
//! errors is heuristic substring matching and may misclassify; that is
//! accepted, not corrected (`Unknown` is the deliberate catch-all).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("Microphone access denied")]
    MicrophoneAccessDenied,

    #[error("Network error")]
    Network,

    #[error("Voice processing error")]
    VoiceProcessing,

    #[error("Widget initialization error")]
    WidgetInit,

    #[error("Unknown error")]
    Unknown,
}

/// Ordered classification table: first rule whose patterns match wins.
/// The vocabulary mirrors what the remote widget and the media-permission
/// layer are known to put in their error messages.
const CLASSIFICATION_RULES: &[(&[&str], ErrorKind)] = &[
    (
        &["microphone", "permission denied", "not allowed"],
        ErrorKind::MicrophoneAccessDenied,
    ),
    (
        &["network", "fetch", "connection", "timed out"],
        ErrorKind::Network,
    ),
    (&["voice", "speech", "audio"], ErrorKind::VoiceProcessing),
    (&["widget", "elevenlabs", "script"], ErrorKind::WidgetInit),
];

impl ErrorKind {
    /// Best-effort mapping from a foreign error message to a kind.
    ///
    /// Deterministic: identical input always yields the same kind.
    pub fn classify(message: &str) -> ErrorKind {
        let haystack = message.to_lowercase();
        for (patterns, kind) in CLASSIFICATION_RULES {
            if patterns.iter().any(|p| haystack.contains(p)) {
                return *kind;
            }
        }
        ErrorKind::Unknown
    }

    /// Whether errors of this kind are retryable from inside the app.
    ///
    /// Microphone denial needs a manual permission grant in the host
    /// environment, outside anything the application can do.
    pub fn default_recoverable(self) -> bool {
        !matches!(self, ErrorKind::MicrophoneAccessDenied)
    }

    /// Wording shown to the user in notifications.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::MicrophoneAccessDenied => {
                "Microphone access was denied. Enable it in your browser settings."
            }
            ErrorKind::Network => "Network problem. Please check your connection and retry.",
            ErrorKind::VoiceProcessing => "Voice processing failed. Please try again.",
            ErrorKind::WidgetInit => "The voice widget failed to start. Please retry.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

/// A classified, user-presentable failure.
///
/// Owned by [`ErrorContext`](crate::errors::ErrorContext)'s active set once
/// reported; never mutated after creation.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub id: Uuid,
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub recoverable: bool,
}

impl AppError {
    /// Construct with the kind's default recoverability.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
            recoverable: kind.default_recoverable(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Classify a foreign error and wrap it.
    pub fn from_foreign(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = ErrorKind::classify(&message);
        Self::new(kind, kind.user_message()).with_details(message)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_vocabulary() {
        assert_eq!(
            ErrorKind::classify("Microphone access was refused"),
            ErrorKind::MicrophoneAccessDenied
        );
        assert_eq!(
            ErrorKind::classify("fetch failed: DNS lookup error"),
            ErrorKind::Network
        );
        assert_eq!(
            ErrorKind::classify("speech synthesis interrupted"),
            ErrorKind::VoiceProcessing
        );
        assert_eq!(
            ErrorKind::classify("widget element not registered"),
            ErrorKind::WidgetInit
        );
    }

    #[test]
    fn test_classify_falls_back_to_unknown() {
        assert_eq!(ErrorKind::classify("segfault"), ErrorKind::Unknown);
        assert_eq!(ErrorKind::classify(""), ErrorKind::Unknown);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let msg = "network voice widget";
        let first = ErrorKind::classify(msg);
        for _ in 0..10 {
            assert_eq!(ErrorKind::classify(msg), first);
        }
        // Ordered table: the network rule precedes voice and widget.
        assert_eq!(first, ErrorKind::Network);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            ErrorKind::classify("NETWORK unreachable"),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_recoverability_defaults() {
        assert!(!ErrorKind::MicrophoneAccessDenied.default_recoverable());
        assert!(ErrorKind::Network.default_recoverable());
        assert!(ErrorKind::VoiceProcessing.default_recoverable());
        assert!(ErrorKind::WidgetInit.default_recoverable());
        assert!(ErrorKind::Unknown.default_recoverable());
    }

    #[test]
    fn test_from_foreign_keeps_original_as_details() {
        let err = AppError::from_foreign("connection reset by peer");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.message, ErrorKind::Network.user_message());
        assert_eq!(err.details.as_deref(), Some("connection reset by peer"));
        assert!(err.recoverable);
    }
}
