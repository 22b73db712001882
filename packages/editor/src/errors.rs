use overmark_model::CommandError;
use thiserror::Error;

/// Errors surfaced by the editor facade.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("data serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
