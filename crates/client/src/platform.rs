//! Client for the intelligence platform's ingestion API.

use async_trait::async_trait;
use orkl_primitives::WorkId;
use orkl_stix::Bundle;
use orkl_sync::{BundleSink, SinkError};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{ClientError, USER_AGENT};

#[derive(Clone, Debug)]
pub struct PlatformClientConfig {
    pub url: Url,
    pub token: Option<String>,
}

/// Write side: initiates works, pushes bundles tagged with the work id and
/// marks works processed once the run is over.
#[derive(Clone, Debug)]
pub struct PlatformClient {
    http: Client,
    config: PlatformClientConfig,
}

#[derive(Debug, Serialize)]
struct InitiateWork<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct WorkCreated {
    id: WorkId,
}

#[derive(Debug, Serialize)]
struct BundleSubmission<'a> {
    bundle: &'a Bundle,
    work_id: &'a WorkId,
    update: bool,
}

#[derive(Debug, Serialize)]
struct WorkProcessed<'a> {
    message: &'a str,
}

impl PlatformClient {
    #[must_use]
    pub fn new(config: PlatformClientConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub async fn initiate_work(&self, name: &str) -> Result<WorkId, ClientError> {
        let created: WorkCreated = self.post_json("works", &InitiateWork { name }).await?;

        debug!(work_id = %created.id, name, "initiated work");

        Ok(created.id)
    }

    pub async fn send_bundle(
        &self,
        bundle: &Bundle,
        work_id: &WorkId,
        update: bool,
    ) -> Result<(), ClientError> {
        self.post_ack(
            "bundles",
            &BundleSubmission {
                bundle,
                work_id,
                update,
            },
        )
        .await
    }

    pub async fn to_processed(&self, work_id: &WorkId, message: &str) -> Result<(), ClientError> {
        self.post_ack(
            &format!("works/{work_id}/processed"),
            &WorkProcessed { message },
        )
        .await
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<I>(&self, path: &str, body: &I) -> Result<(reqwest::Response, String), ClientError>
    where
        I: Serialize,
    {
        let url = self.endpoint(path);

        let mut request = self
            .http
            .post(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .json(body);

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ClientError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::Status { url, status });
        }

        Ok((response, url))
    }

    async fn post_json<I, O>(&self, path: &str, body: &I) -> Result<O, ClientError>
    where
        I: Serialize,
        O: serde::de::DeserializeOwned,
    {
        let (response, url) = self.post(path, body).await?;

        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    async fn post_ack<I>(&self, path: &str, body: &I) -> Result<(), ClientError>
    where
        I: Serialize,
    {
        let _response = self.post(path, body).await?;

        Ok(())
    }
}

#[async_trait]
impl BundleSink for PlatformClient {
    async fn begin_work(&self, name: &str) -> Result<WorkId, SinkError> {
        self.initiate_work(name).await.map_err(SinkError::new)
    }

    async fn submit(
        &self,
        bundle: &Bundle,
        work_id: &WorkId,
        update: bool,
    ) -> Result<(), SinkError> {
        self.send_bundle(bundle, work_id, update)
            .await
            .map_err(SinkError::new)
    }

    async fn complete_work(&self, work_id: &WorkId, message: &str) -> Result<(), SinkError> {
        self.to_processed(work_id, message)
            .await
            .map_err(SinkError::new)
    }
}

#[cfg(test)]
mod tests {
    use orkl_primitives::WorkId;
    use orkl_stix::{Bundle, Identity};

    use super::{BundleSubmission, WorkCreated};

    #[test]
    fn work_creation_response_decodes() {
        let created: WorkCreated = serde_json::from_str(r#"{"id": "work-42"}"#).unwrap();

        assert_eq!(created.id.as_str(), "work-42");
    }

    #[test]
    fn submissions_carry_the_work_id_and_update_flag() {
        let bundle = Bundle::new(vec![Identity::organization("ORKL").into()]);
        let work_id = WorkId::new("work-42");

        let payload = serde_json::to_value(BundleSubmission {
            bundle: &bundle,
            work_id: &work_id,
            update: true,
        })
        .unwrap();

        assert_eq!(payload["work_id"], "work-42");
        assert_eq!(payload["update"], true);
        assert_eq!(payload["bundle"]["type"], "bundle");
        assert_eq!(payload["bundle"]["objects"].as_array().unwrap().len(), 1);
    }
}
