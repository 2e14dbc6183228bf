//! Configuration for the chat core.
//!
//! The only hard requirement is the remote agent id; everything else has a
//! working default. A missing agent id surfaces as a widget-initialization
//! error at connect time, never as a crash.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default URL of the vendor script that registers the widget element.
pub const DEFAULT_SCRIPT_URL: &str = "https://unpkg.com/@elevenlabs/convai-widget-embed";

/// Environment variable carrying the remote agent id.
pub const AGENT_ID_VAR: &str = "CONFAB_AGENT_ID";

/// Environment variable selecting the runtime mode.
pub const ENVIRONMENT_VAR: &str = "CONFAB_ENV";

/// Runtime mode: controls console verbosity and the remote log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Read from `CONFAB_ENV`; anything other than "production" is
    /// treated as development.
    pub fn from_env() -> Self {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Cosmetic attributes set on the remote widget element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAttributes {
    /// Opaque agent identifier, passed through untouched.
    pub agent_id: String,
    pub accent_color: String,
    pub action_label: String,
}

/// Configuration for the widget lifecycle and chat controller.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Remote agent id; required at connect time.
    pub agent_id: Option<String>,

    /// URL of the vendor script; its presence in the host is the
    /// already-loading sentinel.
    pub script_url: String,

    /// Accent color attribute for the widget element.
    pub accent_color: String,

    /// Call-to-action label shown on the widget.
    pub action_label: String,

    /// Delay used by the simulated assistant backend.
    pub reply_delay: Duration,

    /// Runtime mode.
    pub environment: Environment,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            accent_color: "#6c63ff".to_string(),
            action_label: "Talk to the assistant".to_string(),
            reply_delay: Duration::from_millis(800),
            environment: Environment::Development,
        }
    }
}

impl WidgetConfig {
    /// Build from process environment variables.
    pub fn from_env() -> Self {
        Self {
            agent_id: std::env::var(AGENT_ID_VAR).ok().filter(|v| !v.is_empty()),
            environment: Environment::from_env(),
            ..Self::default()
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.script_url = url.into();
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Attributes to stamp onto the widget element; `None` until an agent
    /// id is configured.
    pub fn attributes(&self) -> Option<WidgetAttributes> {
        self.agent_id.as_ref().map(|agent_id| WidgetAttributes {
            agent_id: agent_id.clone(),
            accent_color: self.accent_color.clone(),
            action_label: self.action_label.clone(),
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.script_url.is_empty() {
            return Err("widget script URL is required".to_string());
        }
        match &self.agent_id {
            Some(id) if id.trim().is_empty() => Err("agent id must not be blank".to_string()),
            _ => Ok(()),
        }
    }
}
