use crate::diagnosis::VideoReference;
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SERVICE: &str = "video lookup";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Repair-video search, one call per cause.
#[async_trait]
pub trait VideoLookup: Send + Sync {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<VideoReference>, ServiceError>;
}

#[derive(Clone)]
pub struct YouTubeLookup {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
}

impl YouTubeLookup {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl VideoLookup for YouTubeLookup {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<VideoReference>, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable(SERVICE, "no API key configured"))?;

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", limit_param.as_str()),
                ("key", api_key),
            ])
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

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| {
                item.id.video_id.map(|id| VideoReference {
                    title: item.snippet.title,
                    url: format!("{}{}", WATCH_URL, id),
                })
            })
            .take(limit)
            .collect())
    }
}
