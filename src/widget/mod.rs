pub mod host;
pub mod manager;
pub mod state;

pub use host::{SimulatedHost, SimulatedHostHandle, WidgetHost};
pub use manager::WidgetLifecycleManager;
pub use state::{reduce, VoiceActivity, WidgetEvent, WidgetPhase, WidgetState};
