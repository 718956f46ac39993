use crate::diagnosis::Solution;
use crate::services::fallback::resolve_with_fallback;
use crate::services::KnowledgeSource;
use std::sync::Arc;
use tracing::{debug, info};

/// Price shown on the placeholder solution.
pub const PLACEHOLDER_PRICE_ESTIMATE: &str = "Estimate unavailable";

/// Turns a query into ranked candidate fixes. Total: never fails, never empty.
pub struct SolutionResolver {
    source: Arc<dyn KnowledgeSource>,
    max_results: usize,
    price_estimate: String,
}

impl SolutionResolver {
    /// `price_estimate` is the rough figure attached to every externally
    /// sourced solution.
    pub fn new(source: Arc<dyn KnowledgeSource>, max_results: usize, price_estimate: impl Into<String>) -> Self {
        Self {
            source,
            max_results: max_results.max(1),
            price_estimate: price_estimate.into(),
        }
    }

    /// One attempt against the source, no retries. Source order is kept.
    pub async fn resolve(&self, query: &str) -> Vec<Solution> {
        let hits = resolve_with_fallback(
            self.source.name(),
            self.source.lookup(query, self.max_results),
            Vec::new,
        )
        .await;

        if hits.is_empty() {
            info!("No solutions for '{}', using placeholder", query);
            return vec![placeholder(query)];
        }

        debug!("{} solutions for '{}'", hits.len(), query);
        hits.into_iter()
            .take(self.max_results)
            .map(|hit| Solution {
                title: hit.title,
                source: hit.link,
                price_estimate: self.price_estimate.clone(),
                details: hit.details,
            })
            .collect()
    }
}

/// Deterministic stand-in derived only from the query.
pub fn placeholder(query: &str) -> Solution {
    Solution {
        title: format!("Manual inspection recommended: {}", query),
        source: None,
        price_estimate: PLACEHOLDER_PRICE_ESTIMATE.to_string(),
        details: Some("Online lookup was unavailable. Have a mechanic inspect the vehicle.".to_string()),
    }
}
