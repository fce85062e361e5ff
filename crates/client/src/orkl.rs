//! Client for the ORKL library API.

use core::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orkl_primitives::{CatalogEntry, EntryId, LibraryEntry, Page};
use orkl_sync::{CatalogSource, SourceError};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::{ClientError, USER_AGENT};

/// Total attempts per request, including the first one.
const MAX_ATTEMPTS: u32 = 4;
const BACKOFF_BASE: Duration = Duration::from_secs(6);

#[derive(Clone, Debug)]
pub struct OrklClientConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    /// Courtesy pause after every request, so back-to-back calls respect
    /// the library's rate limit.
    pub request_delay: Duration,
}

/// Read side of the library: versioned catalog pages and individual
/// entries. Retries transient failures with exponential backoff before
/// giving up on an attempt.
#[derive(Clone, Debug)]
pub struct OrklClient {
    http: Client,
    config: OrklClientConfig,
}

impl OrklClient {
    #[must_use]
    pub fn new(config: OrklClientConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Latest version id known to the library.
    pub async fn latest_version(&self) -> Result<EntryId, ClientError> {
        let response: VersionResponse = self.get_json("library/version", &[]).await?;

        Ok(response.data.id)
    }

    /// One page of version entries, newest first. `None` once the catalog
    /// is exhausted.
    pub async fn version_entries(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Option<Page>, ClientError> {
        let query = [
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("order", "desc".to_owned()),
        ];

        let response: VersionEntriesResponse =
            self.get_json("library/version/entries", &query).await?;

        let entries: Vec<CatalogEntry> = response
            .data
            .entries
            .into_iter()
            .map(VersionEntryDto::into_entry)
            .collect();

        if entries.is_empty() {
            return Ok(None);
        }

        Ok(Some(Page::new(entries, limit, offset)))
    }

    /// A single library entry by id.
    pub async fn library_entry(&self, id: &str) -> Result<LibraryEntry, ClientError> {
        let response: LibraryEntryResponse =
            self.get_json(&format!("library/entry/{id}"), &[]).await?;

        Ok(response.data)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if attempt > 1 {
                let backoff = BACKOFF_BASE * 2_u32.saturating_pow(attempt - 2);

                debug!(%url, attempt, ?backoff, "retrying request");

                sleep(backoff).await;
            }

            let mut request = self
                .http
                .get(&url)
                .query(query)
                .header(header::USER_AGENT, USER_AGENT);

            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if attempt < MAX_ATTEMPTS => {
                    warn!(%url, %err, "request failed");

                    continue;
                }
                Err(err) => return Err(ClientError::Request { url, source: err }),
            };

            let status = response.status();

            if retryable(status) && attempt < MAX_ATTEMPTS {
                warn!(%url, %status, "retryable status");

                continue;
            }

            if !status.is_success() {
                return Err(ClientError::Status { url, status });
            }

            let payload = response.json().await.map_err(|source| ClientError::Decode {
                url: url.clone(),
                source,
            })?;

            if !self.config.request_delay.is_zero() {
                sleep(self.config.request_delay).await;
            }

            return Ok(payload);
        }
    }
}

fn retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl CatalogSource for OrklClient {
    async fn latest_version(&self) -> Result<EntryId, SourceError> {
        OrklClient::latest_version(self).await.map_err(SourceError::new)
    }

    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Option<Page>, SourceError> {
        self.version_entries(limit, offset)
            .await
            .map_err(SourceError::new)
    }

    async fn fetch_report(&self, id: &str) -> Result<LibraryEntry, SourceError> {
        self.library_entry(id).await.map_err(SourceError::new)
    }
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    data: VersionDto,
}

#[derive(Debug, Deserialize)]
struct VersionDto {
    #[serde(rename = "ID")]
    id: EntryId,
}

#[derive(Debug, Deserialize)]
struct VersionEntriesResponse {
    data: VersionEntriesData,
}

#[derive(Debug, Deserialize)]
struct VersionEntriesData {
    #[serde(default)]
    entries: Vec<VersionEntryDto>,
}

#[derive(Debug, Deserialize)]
struct VersionEntryDto {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "CreatedAt")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    created_library_entries: Vec<String>,
}

impl VersionEntryDto {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry::new(self.id.into(), self.created_at, self.created_library_entries)
    }
}

#[derive(Debug, Deserialize)]
struct LibraryEntryResponse {
    data: LibraryEntry,
}
