//! HTTP client for the grant-search backend.
//!
//! Two endpoints: job creation (`/api/grants_by_text`) and incremental status
//! polling (`/api/grants_query_status`).

use crate::model::{PollRequest, PollResponse, SubmitRequest, SubmitResponse, WatchConfig};
use anyhow::{Context, Result};

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(cfg: &WatchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.request_timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new server-side query job from free text, returning its id.
    pub async fn submit_query(&self, text: &str) -> Result<u64> {
        let resp = self
            .http
            .post(format!("{}/api/grants_by_text", self.base_url))
            .json(&SubmitRequest { text })
            .send()
            .await
            .context("job creation request failed")?
            .error_for_status()
            .context("backend rejected job creation")?;
        let body: SubmitResponse = resp
            .json()
            .await
            .context("malformed job creation response")?;
        Ok(body.query_id)
    }

    /// Fetch job status plus any records past `start_index`.
    pub async fn poll_status(&self, query_id: u64, start_index: usize) -> Result<PollResponse> {
        let resp = self
            .http
            .post(format!("{}/api/grants_query_status", self.base_url))
            .json(&PollRequest {
                query_id,
                start_index,
            })
            .send()
            .await
            .context("status poll request failed")?
            .error_for_status()
            .context("backend rejected status poll")?;
        resp.json().await.context("malformed status poll response")
    }
}
