//! `triage-classifier` — one call against the language-model endpoint.
//!
//! The engine never trusts this output; it validates every response
//! against the category/language catalog and substitutes defaults.

pub mod client;
pub mod error;

pub use client::Classifier;
pub use error::ClassifierError;
