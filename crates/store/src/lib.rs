use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use orkl_primitives::EntryId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const CHECKPOINT_FILE: &str = "checkpoint.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access checkpoint at {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The persisted document exists but does not parse. Deliberately not
    /// coerced to a fresh checkpoint: that would silently re-process the
    /// entire history. Requires operator intervention.
    #[error("corrupt checkpoint document at {path}")]
    Corrupt {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointDoc {
    last_processed_id: EntryId,
}

/// Durable record of the last fully processed catalog entry.
///
/// A single JSON document holding one integer. Reads fall back to
/// [`EntryId::ZERO`] only when the document does not exist at all; writes go
/// through a sibling temp file and an atomic rename, so a crash mid-write
/// leaves the previous value intact.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    path: Utf8PathBuf,
}

impl CheckpointStore {
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn read(&self) -> Result<EntryId, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path, "no checkpoint yet, starting from zero");

                return Ok(EntryId::ZERO);
            }
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        let doc: CheckpointDoc =
            serde_json::from_str(&content).map_err(|err| StoreError::Corrupt {
                path: self.path.clone(),
                source: err,
            })?;

        Ok(doc.last_processed_id)
    }

    pub fn write(&self, version: EntryId) -> Result<(), StoreError> {
        let doc = CheckpointDoc {
            last_processed_id: version,
        };

        let content = serde_json::to_string(&doc).map_err(|err| StoreError::Corrupt {
            path: self.path.clone(),
            source: err,
        })?;

        let tmp = self.tmp_path();

        fs::write(&tmp, content).map_err(|err| StoreError::Io {
            path: tmp.clone(),
            source: err,
        })?;

        fs::rename(&tmp, &self.path).map_err(|err| StoreError::Io {
            path: self.path.clone(),
            source: err,
        })?;

        debug!(path = %self.path, %version, "checkpoint advanced");

        Ok(())
    }

    fn tmp_path(&self) -> Utf8PathBuf {
        let mut tmp = self.path.clone().into_string();
        tmp.push_str(".tmp");

        Utf8PathBuf::from(tmp)
    }
}
