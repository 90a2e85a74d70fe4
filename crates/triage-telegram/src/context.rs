use std::sync::Arc;

use triage_core::TriageConfig;
use triage_store::{SettingsCache, Store};

/// Shared dependencies injected into every ingress handler.
pub struct IngressContext {
    pub store: Store,
    pub settings: Arc<SettingsCache>,
    pub config: TriageConfig,
}
