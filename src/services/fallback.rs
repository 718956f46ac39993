use crate::error::ServiceError;
use std::future::Future;
use tracing::warn;

/// Await an external call and substitute `fallback()` on any failure.
///
/// Every outbound call site goes through here so that no service outage
/// reaches the caller as an error.
pub async fn resolve_with_fallback<T, Fut, F>(service: &str, call: Fut, fallback: F) -> T
where
    Fut: Future<Output = Result<T, ServiceError>>,
    F: FnOnce() -> T,
{
    match call.await {
        Ok(value) => value,
        Err(e) => {
            warn!("{} call failed, using fallback: {}", service, e);
            fallback()
        }
    }
}
