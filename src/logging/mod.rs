pub mod hooks;
pub mod logger;

pub use hooks::install_global_hooks;
pub use logger::{CaptureSite, ErrorLog, LogEntry, LogLevel, LogSink, LogSnapshot};
