//! Process wiring: config to collaborators to scheduler, then wait for a
//! shutdown signal.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use watchdog_config::{format_duration, HttpConfig, WatchdogConfig};
use watchdog_core::{Notifier, RepoRef};
use watchdog_logging::{init_logger, redact_url};
use watchdog_notifier::{AppriseNotifier, LogNotifier};
use watchdog_scheduler::Scheduler;
use watchdog_sources::{GitHubClient, TelnyxClient};
use watchdog_tasks::{
    BalanceCheckSettings, BalanceCheckTask, PrReviewCheckTask, PrReviewSettings, WatchedRepo,
};
use watchdog_transport::{build_client, ClientOptions, RetryPolicy, RetryableTransport};

/// Load config, start every configured task and run until interrupted.
pub async fn run(config_path: &Path, dry_run: bool) -> Result<()> {
    let (config, mut report) = watchdog_config::load_with_report(config_path).await?;
    if dry_run {
        report.relax("notifier.");
    }

    init_logger(
        config.logging.level(),
        config.logging.dir.as_deref(),
        config.logging.json(),
    )?;
    report.log();
    report.into_result()?;

    info!(config = %config_path.display(), dry_run, "Starting watchdog");

    let mut scheduler = build_scheduler(&config, dry_run)?;
    if !scheduler.has_tasks() {
        bail!(
            "no monitoring tasks configured in {}: set tasks.telnyx.api_url/api_key or tasks.github.repositories",
            config_path.display()
        );
    }
    scheduler.start()?;

    shutdown_signal().await;
    info!("Shutdown signal received, stopping scheduler");
    scheduler.stop().await;
    info!("Watchdog stopped");
    Ok(())
}

/// One pooled client and retry policy shared by every integration.
fn build_transport(http: &HttpConfig) -> Result<RetryableTransport> {
    let client = build_client(&ClientOptions {
        request_timeout: http.request_timeout(),
        connect_timeout: http.connect_timeout(),
        ..Default::default()
    })?;
    let policy = RetryPolicy {
        max_retries: http.max_retries(),
        initial_backoff: http.initial_backoff(),
        max_backoff: http.max_backoff(),
        multiplier: http.backoff_multiplier(),
    };
    Ok(RetryableTransport::new(client, policy))
}

/// Registers a task for every complete section of the config.
pub fn build_scheduler(config: &WatchdogConfig, dry_run: bool) -> Result<Scheduler> {
    let transport = Arc::new(build_transport(&config.http)?);
    let call_budget = config.http.call_budget();

    let notifier: Arc<dyn Notifier> = if dry_run {
        info!("Dry run: alerts will be logged, not sent");
        Arc::new(LogNotifier)
    } else {
        let api_url = config
            .notifier
            .apprise_api_url
            .clone()
            .context("notifier.apprise_api_url is not set")?;
        let services = config.service_urls();
        info!(
            api = %redact_url(&api_url),
            services = ?services.iter().map(|u| redact_url(u)).collect::<Vec<_>>(),
            "Apprise notifier configured"
        );
        Arc::new(AppriseNotifier::new(Arc::clone(&transport), api_url, services))
    };

    let mut scheduler = Scheduler::new();

    if let Some(telnyx) = config.telnyx() {
        let interval = config.task_interval(&telnyx.interval);
        let source = TelnyxClient::new(Arc::clone(&transport), telnyx.api_url(), telnyx.api_key());
        let task = BalanceCheckTask::new(
            BalanceCheckSettings {
                threshold: telnyx.threshold(),
                cooldown: telnyx.cooldown(),
                call_budget,
                ..Default::default()
            },
            Arc::new(source),
            Arc::clone(&notifier),
        );
        info!(
            interval = %format_duration(interval),
            threshold = telnyx.threshold(),
            cooldown = %format_duration(telnyx.cooldown()),
            "Telnyx balance check enabled"
        );
        scheduler.schedule_task(Arc::new(task), interval)?;
    } else if config.tasks.telnyx.is_some() {
        warn!("Telnyx section present but api_url/api_key missing; balance check disabled");
    }

    if let Some(github) = config.github() {
        let interval = config.task_interval(&github.interval);
        let client = Arc::new(
            GitHubClient::new(Arc::clone(&transport))
                .with_base_url(github.base_url())
                .with_token(github.token().map(String::from)),
        );
        let repositories: Vec<WatchedRepo> = github
            .repositories
            .iter()
            .map(|r| WatchedRepo::new(RepoRef::new(r.owner.trim(), r.repo.trim()), r.authors.clone()))
            .collect();
        info!(
            interval = %format_duration(interval),
            stale_days = github.stale_days(),
            cooldown = %format_duration(github.cooldown()),
            repositories = repositories.len(),
            authenticated = github.token().is_some(),
            "GitHub PR review check enabled"
        );
        let task = PrReviewCheckTask::new(
            PrReviewSettings {
                repositories,
                stale_after: github.stale_after(),
                cooldown: github.cooldown(),
                call_budget,
                ..Default::default()
            },
            client.clone(),
            client,
            notifier,
        );
        scheduler.schedule_task(Arc::new(task), interval)?;
    }

    Ok(scheduler)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
