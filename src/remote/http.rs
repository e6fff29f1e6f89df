//! JSON-over-HTTP implementation of [`PipelineApi`].
//!
//! The API token is kept in a [`SecretString`] and only exposed when the
//! bearer header is attached; reqwest marks that header sensitive so it is
//! not printed by its debug logging.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ApiError, DealPage, PageRequest, PipelineApi};
use crate::config::Config;
use crate::error::{DealboardError, Result};
use crate::types::{DealId, Stage, StageId, WorkspaceId};

/// HTTP client for the pipeline API
pub struct HttpPipelineApi {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveDealBody<'a> {
    stage_id: &'a StageId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchBody<'a> {
    ids: &'a [DealId],
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_id: Option<&'a StageId>,
}

/// Batch endpoints list the ids they could not process
#[derive(Debug, Default, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    failed: Vec<DealId>,
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StageOrderBody<'a> {
    stage_ids: &'a [StageId],
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpPipelineApi {
    pub fn new(base_url: Url, token: Option<SecretString>, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(DealboardError::Config(format!(
                "API base URL '{base_url}' cannot have paths"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Build a client from the `api` section of the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.api_base_url()?;
        Self::new(
            base_url,
            config.api_token(),
            Duration::from_secs(config.api.timeout),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DealboardError::Config(format!(
                    "API base URL '{}' cannot have paths",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        check(builder.send().await?).await?;
        Ok(())
    }

    async fn send_batch(&self, action: &str, url: Url, body: &BatchBody<'_>) -> Result<()> {
        let response = check(self.request(Method::POST, url).json(body).send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(());
        }
        let parsed: BatchResponse = serde_json::from_str(&text)?;
        if parsed.failed.is_empty() {
            Ok(())
        } else {
            Err(DealboardError::PartialBatchFailure {
                action: action.to_string(),
                failed: parsed.failed,
            })
        }
    }
}

/// Turn a non-success response into an [`ApiError`]
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    let mut error = ApiError::with_status(message, status);
    if let Some(seconds) = retry_after {
        error = error.with_retry_after(seconds);
    }
    if error.is_transient() {
        tracing::warn!(status = status.as_u16(), "pipeline API server error: {error}");
    } else {
        tracing::debug!(status = status.as_u16(), "pipeline API request failed");
    }
    Err(error.into())
}

impl PipelineApi for HttpPipelineApi {
    async fn fetch_stages(&self, workspace_id: &WorkspaceId) -> Result<Vec<Stage>> {
        let url = self.endpoint(&["workspaces", workspace_id.as_str(), "stages"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn fetch_deals_page(&self, request: &PageRequest) -> Result<DealPage> {
        let url = self.endpoint(&[
            "workspaces",
            request.workspace_id.as_str(),
            "deals",
            "query",
        ])?;
        self.send_json(self.request(Method::POST, url).json(request))
            .await
    }

    async fn move_deal_stage(&self, deal_id: &DealId, stage_id: &StageId) -> Result<()> {
        let url = self.endpoint(&["deals", deal_id.as_str(), "stage"])?;
        self.send_empty(
            self.request(Method::PATCH, url)
                .json(&MoveDealBody { stage_id }),
        )
        .await
    }

    async fn batch_archive(&self, ids: &[DealId]) -> Result<()> {
        let url = self.endpoint(&["deals", "batch", "archive"])?;
        self.send_batch("archive", url, &BatchBody { ids, stage_id: None })
            .await
    }

    async fn batch_delete(&self, ids: &[DealId]) -> Result<()> {
        let url = self.endpoint(&["deals", "batch", "delete"])?;
        self.send_batch("delete", url, &BatchBody { ids, stage_id: None })
            .await
    }

    async fn batch_move_stage(&self, ids: &[DealId], stage_id: &StageId) -> Result<()> {
        let url = self.endpoint(&["deals", "batch", "stage"])?;
        self.send_batch(
            "move",
            url,
            &BatchBody {
                ids,
                stage_id: Some(stage_id),
            },
        )
        .await
    }

    async fn rename_stage(&self, stage_id: &StageId, title: &str) -> Result<()> {
        let url = self.endpoint(&["stages", stage_id.as_str()])?;
        self.send_empty(self.request(Method::PATCH, url).json(&TitleBody { title }))
            .await
    }

    async fn reorder_stages(&self, workspace_id: &WorkspaceId, stage_ids: &[StageId]) -> Result<()> {
        let url = self.endpoint(&["workspaces", workspace_id.as_str(), "stages", "order"])?;
        self.send_empty(
            self.request(Method::PUT, url)
                .json(&StageOrderBody { stage_ids }),
        )
        .await
    }

    async fn delete_stage(&self, stage_id: &StageId) -> Result<()> {
        let url = self.endpoint(&["stages", stage_id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }

    async fn create_stage(&self, workspace_id: &WorkspaceId, title: &str) -> Result<Stage> {
        let url = self.endpoint(&["workspaces", workspace_id.as_str(), "stages"])?;
        self.send_json(self.request(Method::POST, url).json(&TitleBody { title }))
            .await
    }
}
