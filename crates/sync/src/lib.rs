//! Incremental synchronization engine.
//!
//! The engine tracks a monotonically increasing catalog version in a durable
//! checkpoint, plans the not-yet-processed entries each run, processes them
//! under a per-run budget and advances the checkpoint entry-by-entry, only
//! after the entry's records were submitted successfully.
//!
//! Everything talking to the outside world sits behind the [`CatalogSource`],
//! [`BundleSink`] and [`MapReport`] seams, so the engine itself stays
//! sequential, deterministic and testable.

pub mod driver;
pub mod error;
pub mod planner;
pub mod processor;
mod traits;

pub use driver::{RunReport, SyncConfig, SyncDriver};
pub use error::{PlanError, ProcessError, SinkError, SourceError, SyncError};
pub use planner::{Plan, PlanMode, Planner, PlannerConfig};
pub use processor::{EntryOutcome, EntryProcessor};
pub use traits::{BundleSink, CatalogSource, MapReport};
