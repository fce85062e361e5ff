use chrono::Datelike;
use orkl_primitives::{CatalogEntry, EntryId};
use tracing::{debug, info, warn};

use crate::error::PlanError;
use crate::traits::CatalogSource;

/// How the candidate set for a run is assembled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanMode {
    /// First-ever run: no checkpoint exists, the scan is seeded by a
    /// starting calendar year.
    Bootstrap { start_year: i32 },

    /// A checkpoint exists: scan until its id is observed in a page,
    /// confirming there is no gap.
    Resume { checkpoint: EntryId },
}

/// Ordered, filtered list of entries pending processing for one run,
/// ascending by id.
#[derive(Clone, Debug)]
pub struct Plan {
    pub mode: PlanMode,
    pub entries: Vec<CatalogEntry>,
}

impl Plan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig {
    pub page_size: u32,
    pub start_year: i32,
    /// Operator override of the stored checkpoint, validated against the
    /// remote's latest version before use.
    pub resume_from: Option<EntryId>,
}

/// Determines the ordered set of not-yet-processed entries by scanning the
/// newest-first catalog page by page.
#[derive(Debug)]
pub struct Planner<'a, S> {
    source: &'a S,
    config: PlannerConfig,
}

impl<'a, S> Planner<'a, S>
where
    S: CatalogSource,
{
    pub fn new(source: &'a S, config: PlannerConfig) -> Self {
        Self { source, config }
    }

    /// Assembles the plan for one run, given the stored checkpoint.
    pub async fn plan(&self, stored: EntryId) -> Result<Plan, PlanError> {
        let checkpoint = match self.config.resume_from {
            Some(requested) => {
                let latest = self.source.latest_version().await?;

                if requested > latest {
                    return Err(PlanError::StartVersionAhead { requested, latest });
                }

                info!(%requested, %latest, "planning from the configured version override");

                requested
            }
            None => stored,
        };

        let (mode, mut entries) = if checkpoint.is_unset() {
            let mode = PlanMode::Bootstrap {
                start_year: self.config.start_year,
            };

            (mode, self.bootstrap_by_year().await?)
        } else {
            let mode = PlanMode::Resume { checkpoint };

            (mode, self.resume_after(checkpoint).await?)
        };

        // Pages arrive newest-first; processing and checkpointing must go
        // oldest-first.
        entries.sort_by_key(|entry| entry.id);

        Ok(Plan { mode, entries })
    }

    async fn bootstrap_by_year(&self) -> Result<Vec<CatalogEntry>, PlanError> {
        let mut collected = Vec::new();
        let mut offset = 0;

        loop {
            let Some(page) = self.source.fetch_page(self.config.page_size, offset).await? else {
                debug!(offset, "catalog exhausted during bootstrap scan");

                break;
            };

            let total = page.entries.len();
            let matching: Vec<_> = page
                .entries
                .into_iter()
                .filter(|entry| entry.created_at.year() >= self.config.start_year)
                .collect();

            // A page with no qualifying entry means everything further back
            // predates the window.
            if matching.is_empty() {
                debug!(offset, "reached the start-year boundary");

                break;
            }

            debug!(offset, kept = matching.len(), total, "collected bootstrap page");

            collected.extend(matching);
            offset += self.config.page_size;
        }

        Ok(collected)
    }

    async fn resume_after(&self, checkpoint: EntryId) -> Result<Vec<CatalogEntry>, PlanError> {
        let mut collected = Vec::new();
        let mut offset = 0;

        loop {
            let Some(page) = self.source.fetch_page(self.config.page_size, offset).await? else {
                // The checkpointed entry is no longer listed. Everything
                // accumulated is newer than it, so catch up with all of it.
                warn!(%checkpoint, "checkpoint not found in the catalog, catching up in full");

                break;
            };

            let found = page.entries.iter().any(|entry| entry.id == checkpoint);

            collected.extend(page.entries.into_iter().filter(|entry| entry.id > checkpoint));

            if found {
                debug!(%checkpoint, offset, "found the checkpoint boundary");

                break;
            }

            offset += self.config.page_size;
        }

        Ok(collected)
    }
}
