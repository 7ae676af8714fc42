use thiserror::Error;

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Add context to storage errors
pub fn storage_context(operation: &str, key: &str) -> String {
    format!("Failed to {} stored analysis: {}", operation, key)
}

/// Add context to analysis computation errors
pub fn analysis_context(kind: &str, scope: &str) -> String {
    format!("Failed to compute {} for {}", kind, scope)
}

#[derive(Debug, Error)]
pub enum RecomputeError {
    #[error("analysis recomputation is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Invalid(String),
    #[error("collection '{0}' not found")]
    UnknownCollection(String),
    #[error("group '{group}' not found for collection '{collection}'")]
    UnknownGroup { collection: String, group: String },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
