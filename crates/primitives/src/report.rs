use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single threat report from the remote library, fetched by id. This is
/// the child record of a catalog entry; it has no lifecycle of its own.
///
/// Timestamps in the wild are occasionally malformed, so every date field
/// deserializes leniently: an unparsable value becomes `None` instead of
/// failing the whole record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sha1_hash: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, with = "lenient_datetime")]
    pub file_creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_datetime")]
    pub file_modification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub plain_text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub sources: Vec<ReportSource>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub report_names: Vec<String>,
    #[serde(default)]
    pub threat_actors: Vec<ThreatActorRecord>,
    #[serde(default)]
    pub files: Option<ReportFiles>,
}

/// Publisher of a report, e.g. a vendor blog or a CERT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportSource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Threat actor attribution attached to a report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ThreatActorRecord {
    #[serde(default)]
    pub id: String,
    pub main_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Downloadable renditions of a report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportFiles {
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
}

/// Serde adapter that drops unparsable timestamps to `None`.
pub mod lenient_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&value.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;

        Ok(raw.as_deref().and_then(parse))
    }

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        // Some feeds omit the timezone suffix entirely.
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::LibraryEntry;

    #[test]
    fn deserializes_minimal_report() {
        let entry: LibraryEntry = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();

        assert_eq!(entry.id, "abc");
        assert!(entry.created_at.is_none());
        assert!(entry.threat_actors.is_empty());
    }

    #[test]
    fn malformed_dates_become_none() {
        let entry: LibraryEntry = serde_json::from_str(
            r#"{
                "id": "abc",
                "created_at": "not-a-date",
                "file_creation_date": "2023-06-01T12:00:00.000000Z",
                "file_modification_date": "2023-06-01T12:00:00"
            }"#,
        )
        .unwrap();

        assert!(entry.created_at.is_none());
        assert!(entry.file_creation_date.is_some());
        assert!(entry.file_modification_date.is_some());
    }

    #[test]
    fn null_dates_become_none() {
        let entry: LibraryEntry =
            serde_json::from_str(r#"{"id": "abc", "updated_at": null}"#).unwrap();

        assert!(entry.updated_at.is_none());
    }
}
