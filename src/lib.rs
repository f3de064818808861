pub mod aggregator;
pub mod bot;
pub mod core;
pub mod health;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod report;
pub mod scheduler;
pub mod setup;

use crate::aggregator::Aggregator;
use crate::core::config::{AppConfig, HealthConfig, RunMode, ScheduleConfig};
use crate::pipeline::ReportPipeline;
use crate::publish::telegram::TelegramClient;
use crate::publish::{ChannelPublisher, ConsolePublisher, Publisher};
use crate::report::ReportFormatter;
use anyhow::{Result, bail};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub enum AppCommand {
    Serve,
    Report,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("nerkh starting...");

    let config = AppConfig::load(config_path)?;
    debug!(
        channel = ?config.telegram.channel_id,
        interval_secs = config.schedule.interval_secs,
        "Loaded config"
    );

    match command {
        AppCommand::Serve => serve(config).await,
        AppCommand::Report => report_once(&config).await,
    }
}

pub fn build_pipeline(config: &AppConfig) -> Result<ReportPipeline> {
    let aggregator = Aggregator::from_config(&config.providers)?;
    let formatter = ReportFormatter::new(&config.channel_label());
    Ok(ReportPipeline::new(aggregator, formatter))
}

/// Runs a single cycle and prints the report to stdout.
pub async fn report_once(config: &AppConfig) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    match pipeline.run_cycle(&ConsolePublisher).await {
        pipeline::CycleOutcome::Published => Ok(()),
        pipeline::CycleOutcome::NothingToReport => bail!("Every price source failed"),
        pipeline::CycleOutcome::PublishFailed => bail!("Failed to print the report"),
    }
}

/// Starts the liveness endpoint and, depending on configuration, the
/// scheduler and the command bot. Runs until Ctrl-C or until the scheduler
/// or the bot stops.
pub async fn serve(config: AppConfig) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(&config)?);
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    tasks.spawn(run_liveness(config.health.clone()));

    match config.run_mode() {
        RunMode::Broadcast { token, channel_id } => {
            let client = TelegramClient::new(&config.telegram.base_url, &token)?;
            let publisher: Arc<dyn Publisher> =
                Arc::new(ChannelPublisher::new(client.clone(), &channel_id));
            tasks.spawn(run_scheduler(
                Arc::clone(&pipeline),
                publisher,
                config.schedule.clone(),
            ));

            let bot = Arc::new(bot::Bot::new(
                client,
                Arc::clone(&pipeline),
                &channel_id,
                config.schedule.interval_secs,
            ));
            tasks.spawn(async move {
                bot.run().await;
                Ok(())
            });
            info!(channel = %channel_id, "Publishing to channel");
        }
        RunMode::PrintOnly(e) => {
            error!(error = %e, "Configuration error");
            warn!("No bot token, reports will be printed to stdout");
            tasks.spawn(run_scheduler(
                Arc::clone(&pipeline),
                Arc::new(ConsolePublisher),
                config.schedule.clone(),
            ));
        }
        RunMode::Misconfigured(e) => {
            error!(error = %e, "Configuration error, only the liveness endpoint is running");
        }
    }

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
        Some(joined) = tasks.join_next() => match joined {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        },
    };
    tasks.shutdown().await;
    result
}

/// The liveness endpoint never ends `serve`: a port that cannot be bound is
/// logged and publishing carries on.
async fn run_liveness(config: HealthConfig) -> Result<()> {
    if let Err(e) = health::serve(&config).await {
        error!(error = %format!("{e:#}"), "Liveness endpoint unavailable");
    }
    std::future::pending().await
}

async fn run_scheduler(
    pipeline: Arc<ReportPipeline>,
    publisher: Arc<dyn Publisher>,
    schedule: ScheduleConfig,
) -> Result<()> {
    scheduler::run(pipeline, publisher, schedule).await;
    Ok(())
}
