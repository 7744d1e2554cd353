//! notify-test — send a test escalation through the configured channels.
//!
//! Builds the channel set from environment config (SMTP and/or webhook) and
//! dispatches a sample notification, printing per-channel results. Useful for
//! verifying delivery credentials before pointing the scheduler at them.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_core::config::{load_dotenv, Config};
use vigil_core::types::Recipient;
use vigil_notify::email::EmailNotifier;
use vigil_notify::templating::TemplateRenderer;
use vigil_notify::webhook::WebhookNotifier;
use vigil_notify::{Dispatcher, Notification, Notifier};

/// Send a test escalation through the configured notification channels.
#[derive(Parser, Debug)]
#[command(name = "notify-test", version, about)]
struct Cli {
    /// Recipient email address for the test message.
    #[arg(long, env = "NOTIFY_TEST_EMAIL")]
    email: Option<String>,

    /// Subject line override.
    #[arg(long, default_value = "[TEST] Compliance Escalation Test")]
    subject: String,

    /// Body override.
    #[arg(long, default_value = "This is a test escalation from the vigil compliance engine.")]
    body: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

    if let (Some(host), Some(from)) = (config.smtp.host.as_deref(), config.smtp.from.as_deref()) {
        match EmailNotifier::from_config(host, Some(config.smtp.port), Some(config.smtp.tls), from)
        {
            Ok(n) => channels.push(Box::new(n)),
            Err(e) => warn!(error = %e, "email channel not available"),
        }
    }

    if let Some(url) = config.webhook.url.clone() {
        let renderer = Arc::new(TemplateRenderer::new());
        match WebhookNotifier::from_config(url, None, None, None, renderer) {
            Ok(n) => channels.push(Box::new(n)),
            Err(e) => warn!(error = %e, "webhook channel not available"),
        }
    }

    if channels.is_empty() {
        anyhow::bail!("no channels configured; set SMTP_HOST/SMTP_FROM or ESCALATION_WEBHOOK_URL");
    }

    let recipients = match cli.email {
        Some(email) => vec![Recipient {
            id: Uuid::new_v4(),
            full_name: None,
            email,
            is_superuser: true,
            location_ids: Vec::new(),
        }],
        None => Vec::new(),
    };

    let mut notification = Notification::new(cli.subject, cli.body, recipients);
    notification
        .metadata
        .insert("rule_id".to_string(), "test-rule".to_string());

    let dispatcher = Dispatcher::with_defaults(channels);
    let results = dispatcher.dispatch("test-rule", &notification).await;

    for result in &results {
        if result.success {
            info!(channel = %result.channel, duration_ms = result.duration_ms, "delivered");
        } else {
            warn!(
                channel = %result.channel,
                error = result.error.as_deref().unwrap_or("unknown"),
                "failed"
            );
        }
    }

    if results.iter().any(|r| !r.success) {
        anyhow::bail!("one or more channels failed");
    }
    Ok(())
}
