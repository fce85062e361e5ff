use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monotonically increasing identifier assigned to catalog entries by the
/// remote library. Doubles as the checkpoint value: `0` means "never synced".
#[derive(
    Eq, Copy, Hash, Clone, Debug, Default, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// `true` for the never-synced sentinel.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EntryId> for u64 {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
#[error("invalid entry id: {0}")]
pub struct InvalidEntryId(#[from] ParseIntError);

impl FromStr for EntryId {
    type Err = InvalidEntryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One unit of remote catalog history. Fans out into zero or more child
/// library entries, identified by their string ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub child_record_ids: Vec<String>,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(
        id: EntryId,
        created_at: DateTime<Utc>,
        child_record_ids: Vec<String>,
    ) -> Self {
        Self {
            id,
            created_at,
            child_record_ids,
        }
    }
}

/// A batch of catalog entries together with the cursor it was fetched at.
/// The remote serves entries newest-first.
#[derive(Clone, Debug)]
pub struct Page {
    pub entries: Vec<CatalogEntry>,
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>, limit: u32, offset: u32) -> Self {
        Self {
            entries,
            limit,
            offset,
        }
    }
}
