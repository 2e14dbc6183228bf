//! Bounded structured log store.
//!
//! `ErrorLog` is a clone-shareable handle to a fixed-capacity FIFO buffer
//! of [`LogEntry`] records. It is constructed explicitly and passed to
//! consumers; cloning shares the same buffer. Entries are immutable once
//! appended and leave the buffer only by ring-buffer eviction or an
//! explicit `clear`.

use crate::config::Environment;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Default buffer capacity before FIFO eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Where an entry was captured: the Rust analog of URL + user-agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSite {
    /// Executable name, when it can be determined.
    pub process: String,
    /// Crate name/version plus target OS and architecture.
    pub runtime: String,
}

impl CaptureSite {
    fn current() -> Self {
        let process = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            process,
            runtime: format!(
                "{}/{} ({}-{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub context: Option<String>,
    pub capture: CaptureSite,
}

/// Serializable export of the whole buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_logs: usize,
    pub environment: Environment,
    pub logs: Vec<LogEntry>,
}

/// Optional per-entry hook, e.g. a remote log shipper. Only invoked in
/// production mode; panics inside the sink are swallowed.
pub type LogSink = Box<dyn Fn(&LogEntry) + Send + Sync>;

struct LogInner {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    sink: Option<LogSink>,
}

#[derive(Clone)]
pub struct ErrorLog {
    inner: Arc<Mutex<LogInner>>,
    environment: Environment,
}

impl ErrorLog {
    pub fn new(environment: Environment) -> Self {
        Self::with_capacity(environment, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(environment: Environment, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                capacity,
                sink: None,
            })),
            environment,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Install the remote sink hook.
    pub fn set_sink(&self, sink: LogSink) {
        self.inner.lock().sink = Some(sink);
    }

    /// Append an entry, evicting the oldest one beyond capacity.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        context: Option<&str>,
    ) -> LogEntry {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            details,
            context: context.map(str::to_string),
            capture: CaptureSite::current(),
        };

        self.emit_console(&entry);

        let mut inner = self.inner.lock();
        if inner.entries.len() >= inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());

        if self.environment.is_production() {
            if let Some(sink) = &inner.sink {
                // A misbehaving sink must never take the logger down.
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink(&entry)));
            }
        }

        entry
    }

    pub fn error(&self, message: impl Into<String>, context: Option<&str>) -> LogEntry {
        self.log(LogLevel::Error, message, None, context)
    }

    pub fn warn(&self, message: impl Into<String>, context: Option<&str>) -> LogEntry {
        self.log(LogLevel::Warn, message, None, context)
    }

    pub fn info(&self, message: impl Into<String>, context: Option<&str>) -> LogEntry {
        self.log(LogLevel::Info, message, None, context)
    }

    /// No-op in production mode.
    pub fn debug(&self, message: impl Into<String>, context: Option<&str>) -> Option<LogEntry> {
        if self.environment.is_production() {
            return None;
        }
        Some(self.log(LogLevel::Debug, message, None, context))
    }

    fn emit_console(&self, entry: &LogEntry) {
        let context = entry.context.as_deref().unwrap_or("-");
        match entry.level {
            LogLevel::Error => tracing::error!(context, "{}", entry.message),
            LogLevel::Warn => tracing::warn!(context, "{}", entry.message),
            LogLevel::Info if !self.environment.is_production() => {
                tracing::info!(context, "{}", entry.message)
            }
            LogLevel::Debug if !self.environment.is_production() => {
                tracing::debug!(context, "{}", entry.message)
            }
            _ => {}
        }
    }

    pub fn entries_for_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    pub fn entries_for_context(&self, context: &str) -> Vec<LogEntry> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| e.context.as_deref() == Some(context))
            .cloned()
            .collect()
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let inner = self.inner.lock();
        let skip = inner.entries.len().saturating_sub(n);
        inner.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Full-buffer export for the debug download.
    pub fn snapshot(&self) -> LogSnapshot {
        let logs: Vec<LogEntry> = self.inner.lock().entries.iter().cloned().collect();
        LogSnapshot {
            timestamp: Utc::now(),
            total_logs: logs.len(),
            environment: self.environment,
            logs,
        }
    }

    /// Drop every entry; returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }
}
