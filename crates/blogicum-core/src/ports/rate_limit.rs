//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Per-client request budget for sensitive endpoints.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count a request from `key` and report whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub retry_after: Duration,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
