use thiserror::Error;

/// Errors from the language-model endpoint. Callers treat every variant
/// the same way: log, fall back to the default label.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),
}
