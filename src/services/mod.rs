//! Outbound knowledge services and the solution resolver built on them.

pub mod fallback;
pub mod llm;
pub mod resolver;
pub mod search;
pub mod video;

pub use fallback::resolve_with_fallback;
pub use llm::client::CompletionSource;
pub use resolver::{SolutionResolver, PLACEHOLDER_PRICE_ESTIMATE};
pub use search::WebSearchSource;
pub use video::{VideoLookup, YouTubeLookup};

use crate::error::ServiceError;
use async_trait::async_trait;

/// One ranked answer from a knowledge source.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeHit {
    pub title: String,
    pub link: Option<String>,
    pub details: Option<String>,
}

/// Search engine or generative model answering a repair question.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// At most `limit` hits, best first.
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeHit>, ServiceError>;
}
