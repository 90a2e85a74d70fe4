use thiserror::Error;

/// Errors produced while acquiring or driving worker identities.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// No identity qualifies: all are over quota, unauthorized or failing.
    #[error("no worker identity available")]
    Exhausted,

    #[error("identity {name} is not authorized")]
    Unauthorized { name: String },

    #[error("unknown identity: {name}")]
    UnknownIdentity { name: String },

    #[error("bad credentials file {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] triage_store::StoreError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
