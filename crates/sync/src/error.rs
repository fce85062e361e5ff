use orkl_primitives::EntryId;
use orkl_stix::MapError;
use orkl_store::StoreError;
use thiserror::Error;

/// Failure inside the catalog source capability. The source's own retry
/// policy has been exhausted by the time this surfaces.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct SourceError(Box<dyn std::error::Error + Send + Sync>);

impl SourceError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Failure inside the submission sink capability.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct SinkError(Box<dyn std::error::Error + Send + Sync>);

impl SinkError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    /// A page fetch failed mid-scan. Planning aborts rather than returning a
    /// partial newest-first prefix: processing such a prefix would advance
    /// the checkpoint past entries that were never seen.
    #[error("failed to fetch a catalog page")]
    Fetch(#[from] SourceError),

    #[error("configured start version {requested} is ahead of the remote's latest version {latest}")]
    StartVersionAhead { requested: EntryId, latest: EntryId },
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("none of the {attempted} child records of entry {entry} could be retrieved")]
    NoChildren { entry: EntryId, attempted: usize },

    #[error("failed to map child record {child} of entry {entry}")]
    Map {
        entry: EntryId,
        child: String,
        #[source]
        source: MapError,
    },

    #[error("bundle submission failed for entry {entry}")]
    Submit {
        entry: EntryId,
        #[source]
        source: SinkError,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to initiate a work for the run")]
    Work(#[source] SinkError),
}
