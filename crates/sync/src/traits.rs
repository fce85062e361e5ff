use async_trait::async_trait;
use orkl_primitives::{EntryId, LibraryEntry, Page, WorkId};
use orkl_stix::{Bundle, MapError, Object, ReportMapper};

use crate::error::{SinkError, SourceError};

/// Read side of the remote catalog. Implementations carry their own retry
/// policy; an error surfacing here is final for the attempt.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Latest version id known to the remote.
    async fn latest_version(&self) -> Result<EntryId, SourceError>;

    /// One page of catalog entries, newest first. `None` signals the end of
    /// the catalog; a failed fetch is an `Err`. The two are deliberately
    /// distinct so the planner can tell "done" from "broken".
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Option<Page>, SourceError>;

    /// A single child record by id.
    async fn fetch_report(&self, id: &str) -> Result<LibraryEntry, SourceError>;
}

/// Write side: the intelligence platform ingesting mapped objects.
#[async_trait]
pub trait BundleSink: Send + Sync {
    async fn begin_work(&self, name: &str) -> Result<WorkId, SinkError>;

    async fn submit(
        &self,
        bundle: &Bundle,
        work_id: &WorkId,
        update: bool,
    ) -> Result<(), SinkError>;

    async fn complete_work(&self, work_id: &WorkId, message: &str) -> Result<(), SinkError>;
}

/// Pure conversion of a child record into graph objects.
pub trait MapReport: Send + Sync {
    fn map(&self, report: &LibraryEntry) -> Result<Vec<Object>, MapError>;
}

impl MapReport for ReportMapper {
    fn map(&self, report: &LibraryEntry) -> Result<Vec<Object>, MapError> {
        ReportMapper::map(self, report)
    }
}
