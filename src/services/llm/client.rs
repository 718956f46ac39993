use crate::error::ServiceError;
use crate::services::{KnowledgeHit, KnowledgeSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "completion";

/// Chat-completion backed knowledge source. Produces a single hit holding the
/// generated repair steps.
#[derive(Clone)]
pub struct CompletionSource {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl CompletionSource {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
            max_tokens,
            api_key,
        }
    }

    pub fn prompt(query: &str) -> String {
        format!("Suggest detailed step-by-step solutions for this car issue: {}", query)
    }
}

/// First non-empty line, stripped of list/heading markers.
fn headline(text: &str) -> Option<String> {
    text.lines()
        .map(|l| l.trim().trim_start_matches(|c: char| c == '#' || c == '*' || c == '-').trim())
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
}

#[async_trait]
impl KnowledgeSource for CompletionSource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeHit>, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable(SERVICE, "no API key configured"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user".to_string(), content: Self::prompt(query) }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status { service: SERVICE, status: response.status().as_u16() });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::malformed(SERVICE, e.to_string()))?;

        let hits: Vec<KnowledgeHit> = body
            .choices
            .into_iter()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .filter_map(|text| {
                headline(&text).map(|title| KnowledgeHit { title, link: None, details: Some(text) })
            })
            .take(limit)
            .collect();

        debug!("Completion returned {} answers", hits.len());
        Ok(hits)
    }
}
