use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use feedcheck_config::{load as load_config, TelemetryConfig, CONFIG_PATH_ENV};
use feedcheck_drain::{drain_until_idle, DrainReport, DrainSettings, KafkaSource, MessageSource};
use feedcheck_trigger::{Trigger, TriggerClient};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    init_tracing(&config.telemetry);
    info!(target: "config", path = ?config_path, "configuration loaded");

    info!(
        target: "cli",
        trigger_url = %config.trigger.url,
        bootstrap_servers = %config.broker.bootstrap_servers,
        topic = %config.broker.topic,
        "starting package feeds check"
    );

    let trigger = TriggerClient::from_config(&config.trigger)?;
    run(
        &trigger,
        || KafkaSource::connect(&config.broker),
        DrainSettings::from(&config.drain),
        shutdown_signal(),
    )
    .await?;

    Ok(())
}

/// Trigger a feed poll, then drain the topic until it goes quiet.
async fn run<T, S, C, F>(
    trigger: &T,
    connect: C,
    settings: DrainSettings,
    shutdown: F,
) -> Result<DrainReport>
where
    T: Trigger + ?Sized,
    S: MessageSource,
    C: FnOnce() -> feedcheck_drain::Result<S>,
    F: Future<Output = ()>,
{
    info!(target: "cli", "requesting feeds poll data from registries");
    let response = match trigger.fire().await {
        Ok(response) => response,
        Err(err) => {
            if err.is_connection_failure() {
                error!(target: "cli", error = %err, "package feeds poller never became reachable");
            }
            return Err(err).context("failed to trigger package feeds poll");
        }
    };

    if !response.is_success() {
        warn!(
            target: "cli",
            status = response.status,
            "poller answered with a non-success status, draining anyway"
        );
    }

    match response.processed_count() {
        Some(processed) => info!(
            target: "cli",
            status = response.status,
            processed,
            "poller responded: {}",
            response.body
        ),
        None => info!(
            target: "cli",
            status = response.status,
            "poller responded: {}",
            response.body
        ),
    }

    let mut source = connect().context("failed to create broker consumer")?;
    let report = drain_until_idle(&mut source, settings, shutdown).await;

    summarize(&report);
    report.verify()?;
    Ok(report)
}

fn summarize(report: &DrainReport) {
    info!(
        target: "cli",
        total = report.total(),
        discarded = report.discarded,
        "received a total of {} messages",
        report.total()
    );
    for (feed, count) in report.per_feed() {
        info!(target: "cli", %feed, count, "packages per feed");
    }
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if telemetry.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_names(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_level(true),
            )
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut interrupt), Ok(mut terminate)) => {
                tokio::select! {
                    _ = interrupt.recv() => {},
                    _ = terminate.recv() => {},
                }
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(target: "cli", error = %err, "cannot install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target: "cli", error = %err, "cannot install ctrl_c handler");
            std::future::pending::<()>().await;
        }
    }

    info!(target: "cli", "shutdown signal received");
}
