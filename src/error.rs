use thiserror::Error;

/// Every failure the dashboard can report to the user.
///
/// None of these are fatal: the UI layer shows the message and keeps
/// running with whatever data it still has.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Bad format, unreadable file or decode failure.
    #[error("{0}")]
    Ingestion(String),

    /// Required column(s) missing after ingestion or merge.
    #[error("Missing required column(s): {}", .0.join(", "))]
    Schema(Vec<String>),

    /// Non-success HTTP status, transport failure or malformed payload.
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),
}

impl PipelineError {
    pub fn ingestion(err: anyhow::Error) -> Self {
        PipelineError::Ingestion(format!("{err:#}"))
    }

    pub fn missing_column(name: &str) -> Self {
        PipelineError::Schema(vec![name.to_string()])
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
