//! scheduler-worker — loads rule documents, reconciles them into the job
//! registry, and polls for due compliance checks.
//!
//! Escalation channels are built from environment config (SMTP and/or
//! webhook). With neither configured the worker still runs; escalations are
//! visible in the logs only.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use vigil_core::config::{load_dotenv, Config};
use vigil_notify::email::EmailNotifier;
use vigil_notify::templating::TemplateRenderer;
use vigil_notify::webhook::WebhookNotifier;
use vigil_notify::{Dispatcher, Notifier};
use vigil_rules::evaluator::ComplianceEvaluator;
use vigil_rules::loader::{LoadStatus, RuleLoader};
use vigil_rules::reconciler::Reconciler;
use vigil_rules::registry::InMemoryRegistry;
use vigil_rules::scheduler::SchedulerCore;
use vigil_rules::stores::{
    InMemoryEventStore, InMemoryEventTypeDirectory, InMemoryGroupDirectory,
    InMemoryLocationDirectory, InMemoryRuleStore,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Compliance scheduler worker — reconciles rules and fires due checks.
#[derive(Parser, Debug)]
#[command(name = "scheduler-worker", version, about)]
struct Cli {
    /// Path to the rule documents directory.
    #[arg(long, env = "RULES_DIR", default_value = "data/rules")]
    rules_dir: String,

    /// Override the registry poll interval in seconds (clamped to 60).
    #[arg(long)]
    tick_secs: Option<u64>,
}

// ── main ────────────────────────────────────────────────────────────

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

    // ── Escalation channels ─────────────────────────────────

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
        warn!("no notification channels configured; escalations will only appear in logs");
    }
    let dispatcher = Arc::new(Dispatcher::with_defaults(channels));

    // ── Stores and engine wiring ────────────────────────────

    let registry = Arc::new(InMemoryRegistry::new());
    let rules = Arc::new(InMemoryRuleStore::new());
    let events = Arc::new(InMemoryEventStore::new());
    let locations = Arc::new(InMemoryLocationDirectory::new());
    let groups = Arc::new(InMemoryGroupDirectory::new());
    let event_types = Arc::new(InMemoryEventTypeDirectory::new());

    let reconciler = Reconciler::new(registry.clone(), rules.clone());

    // ── Load and reconcile rule documents ───────────────────

    let loader = RuleLoader::new(cli.rules_dir.clone().into());
    let results = loader.load_all()?;
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .count();
    info!(
        loaded = loader.len(),
        failed,
        dir = %cli.rules_dir,
        "rule documents scanned"
    );

    for doc in loader.documents() {
        let scope = match doc.scope() {
            Ok(scope) => scope,
            Err(e) => {
                error!(tenant = %doc.tenant, error = %e, "skipping document with bad scope");
                continue;
            }
        };
        rules.upsert(&scope, doc.rule.clone()).await;
        match reconciler.reconcile(&scope, &doc.rule).await {
            Ok(jobs) => {
                info!(tenant = %scope.tenant, rule_id = %doc.rule.id, jobs = jobs.len(), "rule installed")
            }
            Err(e) => {
                error!(tenant = %scope.tenant, rule_id = %doc.rule.id, error = %e, "reconciliation failed")
            }
        }
    }

    // ── Scheduler loop ──────────────────────────────────────

    let evaluator = Arc::new(ComplianceEvaluator::new(
        rules,
        events,
        locations,
        groups,
        event_types,
        dispatcher,
    ));
    let core = Arc::new(SchedulerCore::new(
        registry,
        evaluator,
        Duration::from_secs(config.scheduler.eval_timeout_secs),
    ));

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            shutdown_signal.notify_waiters();
        }
    });

    let tick = cli.tick_secs.unwrap_or(config.scheduler.tick_secs).min(60);
    info!("scheduler-worker starting");
    core.run(Duration::from_secs(tick), shutdown).await;
    info!("scheduler-worker exited cleanly");
    Ok(())
}
