use orkl_primitives::{CatalogEntry, WorkId};
use orkl_stix::Bundle;
use tracing::{info, warn};

use crate::error::ProcessError;
use crate::traits::{BundleSink, CatalogSource, MapReport};

/// What processing one entry produced.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntryOutcome {
    /// Child records successfully retrieved.
    pub children: usize,
    pub failed_children: usize,
    pub bundles_submitted: usize,
    pub objects_submitted: usize,
}

/// Processes a single catalog entry: resolve its child records, map each
/// through the converter, submit the resulting bundles.
///
/// Child fetches are best-effort: an individual failure is logged and
/// skipped, and the entry as a whole only fails when no child could be
/// retrieved at all, or when mapping or submission breaks. Submission is
/// idempotent on the platform side, so an entry retried after a partial
/// submission is harmless.
#[derive(Debug)]
pub struct EntryProcessor<'a, S, K, M> {
    source: &'a S,
    sink: &'a K,
    mapper: &'a M,
    update_existing: bool,
}

impl<'a, S, K, M> EntryProcessor<'a, S, K, M>
where
    S: CatalogSource,
    K: BundleSink,
    M: MapReport,
{
    pub fn new(source: &'a S, sink: &'a K, mapper: &'a M, update_existing: bool) -> Self {
        Self {
            source,
            sink,
            mapper,
            update_existing,
        }
    }

    pub async fn process(
        &self,
        entry: &CatalogEntry,
        work_id: &WorkId,
    ) -> Result<EntryOutcome, ProcessError> {
        if entry.child_record_ids.is_empty() {
            info!(entry = %entry.id, "entry has no child records, nothing to submit");

            return Ok(EntryOutcome::default());
        }

        let mut reports = Vec::new();
        let mut failed_children = 0;

        for child in &entry.child_record_ids {
            match self.source.fetch_report(child).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(entry = %entry.id, %child, %err, "failed to fetch child record");

                    failed_children += 1;
                }
            }
        }

        if reports.is_empty() {
            return Err(ProcessError::NoChildren {
                entry: entry.id,
                attempted: entry.child_record_ids.len(),
            });
        }

        let mut outcome = EntryOutcome {
            children: reports.len(),
            failed_children,
            ..EntryOutcome::default()
        };

        for report in &reports {
            let objects = self.mapper.map(report).map_err(|source| ProcessError::Map {
                entry: entry.id,
                child: report.id.clone(),
                source,
            })?;

            if objects.is_empty() {
                continue;
            }

            let bundle = Bundle::new(objects);

            info!(
                entry = %entry.id,
                child = %report.id,
                objects = bundle.len(),
                "submitting bundle"
            );

            self.sink
                .submit(&bundle, work_id, self.update_existing)
                .await
                .map_err(|source| ProcessError::Submit {
                    entry: entry.id,
                    source,
                })?;

            outcome.bundles_submitted += 1;
            outcome.objects_submitted += bundle.len();
        }

        Ok(outcome)
    }
}
