//! Upstash Redis REST client implementing the [`Cache`] seam.
//!
//! Commands go over the single-command REST endpoint: a JSON array body like
//! `["SET", key, value, "EX", "600"]` POSTed to the base URL with a bearer
//! token, answered as `{"result": ...}` or `{"error": ...}`.

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Deserialize;

use crate::cache::Cache;

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct UpstashCache {
    client: Client,
    base_url: String,
    token: String,
}

impl UpstashCache {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn command(&self, cmd: &[&str]) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&cmd)
            .send()
            .await?
            .error_for_status()?;

        let body: CommandResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(anyhow!("cache command failed: {error}"));
        }
        Ok(body.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait::async_trait]
impl Cache for UpstashCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.command(&["GET", key]).await? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Err(anyhow!("unexpected GET result: {other}")),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let ttl = ttl_seconds.to_string();
        self.command(&["SET", key, value, "EX", &ttl]).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }
}
