pub mod chat;
pub mod config;
pub mod errors;
pub mod logging;
pub mod widget;

pub use chat::{ChatController, ChatStatus};
pub use config::{Environment, WidgetConfig};
pub use errors::{AppError, ErrorContext, ErrorKind, Result};
pub use logging::ErrorLog;
pub use widget::{WidgetLifecycleManager, WidgetState};
