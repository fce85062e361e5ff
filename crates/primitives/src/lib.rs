pub mod catalog;
pub mod report;
pub mod work;

pub use catalog::{CatalogEntry, EntryId, InvalidEntryId, Page};
pub use report::{LibraryEntry, ReportFiles, ReportSource, ThreatActorRecord};
pub use work::WorkId;
