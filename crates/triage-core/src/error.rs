use thiserror::Error;

/// Errors shared across the workspace root.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration failed to load or type-check. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
