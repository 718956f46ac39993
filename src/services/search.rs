use crate::error::ServiceError;
use crate::services::{KnowledgeHit, KnowledgeSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "web search";

/// Google Custom Search compatible JSON API (`items[].title`, `items[].link`).
#[derive(Clone)]
pub struct WebSearchSource {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    title: String,
    link: Option<String>,
    snippet: Option<String>,
}

impl WebSearchSource {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, engine_id: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            api_key,
            engine_id,
        }
    }
}

#[async_trait]
impl KnowledgeSource for WebSearchSource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeHit>, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable(SERVICE, "no API key configured"))?;
        let mut params = vec![
            ("key", api_key.to_string()),
            ("q", query.to_string()),
            ("num", limit.to_string()),
        ];
        if let Some(cx) = &self.engine_id {
            params.push(("cx", cx.clone()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status { service: SERVICE, status: response.status().as_u16() });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::malformed(SERVICE, e.to_string()))?;
        debug!("Search returned {} items", body.items.len());

        Ok(body
            .items
            .into_iter()
            .take(limit)
            .map(|item| KnowledgeHit { title: item.title, link: item.link, details: item.snippet })
            .collect())
    }
}
