use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("invalid browser configuration: {0}")]
    BrowserConfig(String),

    #[error("timed out after {timeout_ms}ms waiting for {step}")]
    Timeout { step: String, timeout_ms: u64 },

    #[error("invalid CSS selector for {field}: \"{selector}\"")]
    InvalidSelector { field: String, selector: String },

    #[error("failed to read response body for {url}: {reason}")]
    ResponseBody { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
