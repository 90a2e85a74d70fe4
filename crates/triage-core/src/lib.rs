pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{Action, Category, ContentKind, Lang, Template};
pub use config::TriageConfig;
pub use error::{CoreError, Result};
