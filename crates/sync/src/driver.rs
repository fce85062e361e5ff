use core::time::Duration;

use chrono::Utc;
use orkl_primitives::EntryId;
use orkl_store::CheckpointStore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::SyncError;
use crate::planner::{Planner, PlannerConfig};
use crate::processor::EntryProcessor;
use crate::traits::{BundleSink, CatalogSource, MapReport};

/// Tunables of the synchronization loop.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Display name used for work descriptions.
    pub connector_name: String,
    pub page_size: u32,
    /// Per-run processing budget. Zero means plan-only: the plan is
    /// computed but nothing is processed.
    pub max_entries_per_run: u32,
    pub history_start_year: i32,
    /// One-shot operator override of the stored checkpoint, consumed by the
    /// first planning that uses it.
    pub resume_from: Option<EntryId>,
    /// Re-sync on every interval. When disabled the driver performs one
    /// effective sync and then idles.
    pub maintain_data: bool,
    /// Stop after a single pass instead of looping.
    pub run_and_terminate: bool,
    pub update_existing_data: bool,
    pub interval: Duration,
    /// Extra settle delay before the interval sleep.
    pub cooldown: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            connector_name: "ORKL".to_owned(),
            page_size: 100,
            max_entries_per_run: 20,
            history_start_year: 2023,
            resume_from: None,
            maintain_data: true,
            run_and_terminate: false,
            update_existing_data: true,
            interval: Duration::from_secs(24 * 60 * 60),
            cooldown: Duration::ZERO,
        }
    }
}

/// Totals of one synchronization run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunReport {
    pub planned: usize,
    pub processed: usize,
    pub failed: usize,
    pub deferred: usize,
    pub bundles: usize,
    /// Highest id checkpointed during this run, if any.
    pub checkpoint: Option<EntryId>,
}

impl RunReport {
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "processed {}/{} entries ({} failed, {} deferred), submitted {} bundles",
            self.processed, self.planned, self.failed, self.deferred, self.bundles
        )
    }
}

/// Orchestrates planner and processor under the per-run budget, advancing
/// the checkpoint entry-by-entry.
///
/// Entries are processed and checkpointed in strictly ascending id order; a
/// failed entry ends the run's processing phase, since checkpointing
/// anything beyond it would skip it permanently.
#[derive(Debug)]
pub struct SyncDriver<S, K, M> {
    config: SyncConfig,
    source: S,
    sink: K,
    mapper: M,
    checkpoint: CheckpointStore,
    synced_once: bool,
}

impl<S, K, M> SyncDriver<S, K, M>
where
    S: CatalogSource,
    K: BundleSink,
    M: MapReport,
{
    pub fn new(
        config: SyncConfig,
        source: S,
        sink: K,
        mapper: M,
        checkpoint: CheckpointStore,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            mapper,
            checkpoint,
            synced_once: false,
        }
    }

    /// Drives the loop until cancelled, or through exactly one pass when
    /// run-and-terminate is set. Run-level failures are logged and retried
    /// on the next interval; in run-and-terminate mode they propagate.
    pub async fn run(mut self) -> Result<(), SyncError> {
        loop {
            if self.config.maintain_data || !self.synced_once {
                match self.run_once().await {
                    Ok(report) => {
                        info!(checkpoint = ?report.checkpoint, "{}", report.summary());

                        self.synced_once = true;
                    }
                    Err(err) if self.config.run_and_terminate => return Err(err),
                    Err(err) => {
                        error!(%err, "synchronization run failed, retrying on the next interval");
                    }
                }
            } else {
                info!("periodic re-sync disabled, idling");
            }

            if self.config.run_and_terminate {
                info!("run-and-terminate set, stopping after one pass");

                return Ok(());
            }

            if !self.config.cooldown.is_zero() {
                sleep(self.config.cooldown).await;
            }

            info!(interval = ?self.config.interval, "sleeping until the next run");

            sleep(self.config.interval).await;
        }
    }

    /// One full pass: plan, process under budget, checkpoint per entry.
    pub async fn run_once(&mut self) -> Result<RunReport, SyncError> {
        let stored = self.checkpoint.read()?;

        let planner_config = PlannerConfig {
            page_size: self.config.page_size,
            start_year: self.config.history_start_year,
            resume_from: self.config.resume_from.take(),
        };

        let plan = Planner::new(&self.source, planner_config).plan(stored).await?;

        info!(mode = ?plan.mode, entries = plan.len(), "assembled plan");

        let mut report = RunReport {
            planned: plan.len(),
            ..RunReport::default()
        };

        let budget = self.config.max_entries_per_run as usize;

        if plan.is_empty() || budget == 0 {
            report.deferred = plan.len();

            return Ok(report);
        }

        let work_id = self
            .sink
            .begin_work(&self.work_name())
            .await
            .map_err(SyncError::Work)?;

        let processor = EntryProcessor::new(
            &self.source,
            &self.sink,
            &self.mapper,
            self.config.update_existing_data,
        );

        for (index, entry) in plan.entries.iter().enumerate() {
            if report.processed >= budget {
                report.deferred = plan.len() - index;

                info!(deferred = report.deferred, budget, "per-run budget exhausted, deferring the rest");

                break;
            }

            match processor.process(entry, &work_id).await {
                Ok(outcome) => {
                    self.checkpoint.write(entry.id)?;

                    report.processed += 1;
                    report.bundles += outcome.bundles_submitted;
                    report.checkpoint = Some(entry.id);
                }
                Err(err) => {
                    // Anything checkpointed beyond this entry would skip it
                    // permanently, so the remainder waits for the next run.
                    error!(entry = %entry.id, %err, "entry processing failed, deferring the remainder");

                    report.failed = 1;
                    report.deferred = plan.len() - index - 1;

                    break;
                }
            }
        }

        if let Err(err) = self.sink.complete_work(&work_id, &report.summary()).await {
            warn!(%work_id, %err, "failed to mark the work processed");
        }

        Ok(report)
    }

    fn work_name(&self) -> String {
        format!(
            "{} run @ {}",
            self.config.connector_name,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )
    }
}
