use thiserror::Error;

/// Errors inside per-ticket handler tasks. None of these ever kill the
/// polling loop; the task logs and aborts itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] triage_store::StoreError),

    #[error("platform error: {0}")]
    Platform(#[from] teloxide::RequestError),

    #[error(transparent)]
    Worker(#[from] triage_workers::WorkerError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
