use anyhow::Result;
use confab::chat::{ChatController, SimulatedBackend};
use confab::config::WidgetConfig;
use confab::errors::ErrorContext;
use confab::logging::{install_global_hooks, ErrorLog};
use confab::widget::{SimulatedHost, WidgetLifecycleManager};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confab=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting confab chat core");

    let config = WidgetConfig::from_env();
    let log = ErrorLog::new(config.environment);
    install_global_hooks(&log);
    let errors = ErrorContext::new(log.clone());

    // Demo wiring: simulated widget host and assistant backend in place of
    // the real vendor element.
    let host = SimulatedHost::new();
    let widget = WidgetLifecycleManager::new(
        host,
        config.clone().with_agent_id(
            config
                .agent_id
                .clone()
                .unwrap_or_else(|| "demo-agent".to_string()),
        ),
        errors.clone(),
    );
    let backend = SimulatedBackend::new(config.reply_delay);
    let mut controller = ChatController::new(widget, backend, errors.clone());

    controller.connect();
    controller.send_text("Hello");

    while controller.timeline().len() < 2 {
        controller.poll_events();
        std::thread::sleep(Duration::from_millis(20));
    }

    for message in controller.timeline().all() {
        info!(sender = ?message.sender, status = ?message.status, "{}", message.text);
    }

    let snapshot = log.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
