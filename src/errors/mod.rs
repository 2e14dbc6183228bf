pub mod context;
pub mod taxonomy;

pub use context::{ErrorContext, Notification};
pub use taxonomy::{AppError, ErrorKind, Result};
