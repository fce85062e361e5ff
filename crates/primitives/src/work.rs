use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token correlating all submissions made during one synchronization
/// run. Issued by the intelligence platform when a work is initiated.
#[derive(Eq, Clone, Debug, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(String);

impl WorkId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<String> for WorkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
