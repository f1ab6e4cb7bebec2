use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to start metrics server on {addr}: {reason}")]
    MetricsBind { addr: String, reason: String },

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("metrics output is not valid UTF-8")]
    NonUtf8,

    #[error("console write failed: {0}")]
    Console(#[from] std::io::Error),

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
