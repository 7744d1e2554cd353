use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub smtp: SmtpConfig,
    pub webhook: WebhookConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            scheduler: SchedulerConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            webhook: WebhookConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  scheduler:  tick={}s, eval_timeout={}s, default_tz={}",
            self.scheduler.tick_secs,
            self.scheduler.eval_timeout_secs,
            self.scheduler.default_timezone
        );
        tracing::info!(
            "  smtp:       host={}, port={}, from={}",
            self.smtp.host.as_deref().unwrap_or("(none)"),
            self.smtp.port,
            self.smtp.from.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  webhook:    url={}",
            self.webhook.url.as_deref().unwrap_or("(none)")
        );
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Registry poll interval in seconds. The runtime must tick at least
    /// once per minute; values above 60 are clamped.
    pub tick_secs: u64,
    /// Per-evaluation timeout in seconds.
    pub eval_timeout_secs: u64,
    /// IANA timezone used for tenants that don't configure one.
    pub default_timezone: String,
}

impl SchedulerConfig {
    fn from_env() -> Self {
        Self {
            tick_secs: env_u64("SCHEDULER_TICK_SECS", 60).min(60),
            eval_timeout_secs: env_u64("SCHEDULER_EVAL_TIMEOUT_SECS", 300),
            default_timezone: env_or("SCHEDULER_DEFAULT_TZ", "UTC"),
        }
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub tls: bool,
    pub from: Option<String>,
}

impl SmtpConfig {
    fn from_env() -> Self {
        Self {
            host: env_opt("SMTP_HOST"),
            port: env_u16("SMTP_PORT", 587),
            tls: env_or("SMTP_TLS", "true") == "true",
            from: env_opt("SMTP_FROM"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.from.is_some()
    }
}

// ── Webhook ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
}

impl WebhookConfig {
    fn from_env() -> Self {
        Self {
            url: env_opt("ESCALATION_WEBHOOK_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}
