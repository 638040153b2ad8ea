use thiserror::Error;
use tideline_core::CoreError;

/// Fatal actor errors. Any of these cancels the whole service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The indexing core failed in a way that is not a recoverable reorg.
    #[error(transparent)]
    Core(#[from] CoreError),
}
