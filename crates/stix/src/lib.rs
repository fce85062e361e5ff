//! STIX 2.1 object model and the report-to-graph conversion.
//!
//! Object identifiers are deterministic (UUIDv5 over the identifying
//! properties), so re-mapping the same report yields the same ids and the
//! platform deduplicates on ingestion instead of accumulating copies.

pub mod id;
pub mod mapper;
pub mod objects;

pub use mapper::{MapError, MapperConfig, ReportMapper};
pub use objects::{
    Bundle, ExternalReference, Identity, Object, Relationship, Report, ThreatActor, Tool,
};
