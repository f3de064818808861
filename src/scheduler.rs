use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::config::ScheduleConfig;
use crate::pipeline::ReportPipeline;
use crate::publish::Publisher;

/// Runs a report cycle after the initial delay and then once per interval.
/// Never returns; cancel the task to stop it.
pub async fn run(
    pipeline: Arc<ReportPipeline>,
    publisher: Arc<dyn Publisher>,
    schedule: ScheduleConfig,
) {
    info!(
        interval_secs = schedule.interval_secs,
        initial_delay_secs = schedule.initial_delay_secs,
        "Scheduler started"
    );
    time::sleep(schedule.initial_delay()).await;

    let mut ticker = time::interval(schedule.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let outcome = pipeline.run_cycle(publisher.as_ref()).await;
        debug!(?outcome, "Scheduled cycle finished");
    }
}
