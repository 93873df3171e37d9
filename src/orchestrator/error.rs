use crate::source::SourceError;

/// Errors that can occur during orchestrator operations
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("source already registered: {0}")]
    DuplicateSource(String),

    #[error("orchestrator has been stopped")]
    Stopped,

    #[error(transparent)]
    Source(#[from] SourceError),
}
