//! One aggregate → format → publish cycle.

use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::publish::Publisher;
use crate::report::ReportFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published,
    NothingToReport,
    PublishFailed,
}

pub struct ReportPipeline {
    aggregator: Aggregator,
    formatter: ReportFormatter,
}

impl ReportPipeline {
    pub fn new(aggregator: Aggregator, formatter: ReportFormatter) -> Self {
        ReportPipeline {
            aggregator,
            formatter,
        }
    }

    /// Builds a fresh snapshot and renders it. Returns `None` when no
    /// primary metric could be fetched.
    pub async fn prepare_report(&self) -> Option<String> {
        let snapshot = self.aggregator.build_snapshot().await;
        if !snapshot.is_reportable() {
            error!("Every price source failed, nothing to report");
            return None;
        }
        Some(self.formatter.format(&snapshot))
    }

    /// Runs a full cycle. Publish failures are logged and not retried; the
    /// next cycle tries again.
    pub async fn run_cycle(&self, publisher: &dyn Publisher) -> CycleOutcome {
        let Some(report) = self.prepare_report().await else {
            return CycleOutcome::NothingToReport;
        };
        match publisher.publish(&report).await {
            Ok(()) => {
                info!("Report published");
                CycleOutcome::Published
            }
            Err(e) => {
                error!(error = %e, "Failed to publish report");
                CycleOutcome::PublishFailed
            }
        }
    }
}
