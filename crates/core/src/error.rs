use thiserror::Error;

pub type OptimizeResult<T> = Result<T, OptimizeError>;

/// Failure taxonomy for the optimization loop. Each variant maps to one
/// isolation boundary: a `Collection` error skips the campaign for the
/// cycle, a `Dispatch` error lands in the cycle report's `failed` bucket,
/// and a `ContentGeneration` error fails only the action that needed it.
#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metric collection failed: {0}")]
    Collection(String),

    #[error("Metrics analysis failed: {0}")]
    Analysis(String),

    #[error("Action dispatch failed: {0}")]
    Dispatch(String),

    #[error("Content generation failed: {0}")]
    ContentGeneration(String),

    #[error("Campaign store error: {0}")]
    Store(String),

    #[error("Ad platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Structured failure surfaced by the external ad platform boundary.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Rate limited by ad platform: {0}")]
    RateLimited(String),

    #[error("Ad platform rejected the request: {0}")]
    Validation(String),

    #[error("Ad platform call timed out after {0}s")]
    Timeout(u64),

    #[error("Ad platform API error: {0}")]
    Api(String),

    #[error("Not found on ad platform: {0}")]
    NotFound(String),
}
