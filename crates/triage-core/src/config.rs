use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (triage.toml + TRIAGE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    pub bot: BotConfig,
    pub support: SupportConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// The user-facing bot identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub token: String,
    /// Bot handle without the leading `@`, as resolvable by the user API.
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    /// Admin handle used in development mode instead of the one stored in
    /// `bot_settings.support_username`.
    pub admin_username: String,
    #[serde(default)]
    pub development_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub api_key: String,
    #[serde(default = "default_classifier_base_url")]
    pub base_url: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// Tried when the primary model errors out.
    #[serde(default = "default_classifier_fallback_model")]
    pub fallback_model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_classifier_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_classifier_timeout_secs")]
    pub timeout_secs: u64,
}

/// Worker-identity pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Directory holding `<identity>.session` + `<identity>.json` pairs.
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,
    /// Per-identity cap on created operator groups.
    #[serde(default = "default_group_limit")]
    pub group_limit: u32,
    /// Local session-bridge daemon holding the user-API sessions.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
            group_limit: default_group_limit(),
            bridge_url: default_bridge_url(),
            proxy: ProxyConfig::default(),
        }
    }
}

/// Sticky egress proxy. The per-identity session password is derived from
/// `base_password`, so only the shared parts live in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub base_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between poller ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Minimum idle seconds after the user's latest message before the
    /// engine reacts.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: i64,
    /// Replied tickets idle longer than this many days are closed.
    #[serde(default = "default_idle_close_days")]
    pub idle_close_days: i64,
    /// Unread-message count that trips the spam shield.
    #[serde(default = "default_spam_threshold")]
    pub spam_threshold: usize,
    /// Mute duration applied by the spam shield.
    #[serde(default = "default_mute_hours")]
    pub mute_hours: i64,
    /// Known-invalid chat id targeted by the deletion probe.
    #[serde(default = "default_probe_chat_id")]
    pub probe_chat_id: i64,
    /// Directory with the static images (payment guides, group photo).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Bot-settings cache refresh interval.
    #[serde(default = "default_settings_refresh_secs")]
    pub settings_refresh_secs: u64,
    /// Operator groups idle longer than this many days are reaped.
    #[serde(default = "default_group_idle_days")]
    pub group_idle_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            debounce_secs: default_debounce_secs(),
            idle_close_days: default_idle_close_days(),
            spam_threshold: default_spam_threshold(),
            mute_hours: default_mute_hours(),
            probe_chat_id: default_probe_chat_id(),
            data_dir: default_data_dir(),
            settings_refresh_secs: default_settings_refresh_secs(),
            group_idle_days: default_group_idle_days(),
        }
    }
}

fn default_db_path() -> String {
    "triage.db".to_string()
}
fn default_classifier_base_url() -> String {
    "https://nano-gpt.com".to_string()
}
fn default_classifier_model() -> String {
    "gpt-5-mini".to_string()
}
fn default_classifier_fallback_model() -> String {
    "yi-lightning".to_string()
}
fn default_classifier_max_tokens() -> u32 {
    15
}
fn default_classifier_timeout_secs() -> u64 {
    20
}
fn default_sessions_dir() -> String {
    "sessions/support".to_string()
}
fn default_group_limit() -> u32 {
    45
}
fn default_bridge_url() -> String {
    "http://127.0.0.1:9023".to_string()
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_debounce_secs() -> i64 {
    20
}
fn default_idle_close_days() -> i64 {
    2
}
fn default_spam_threshold() -> usize {
    50
}
fn default_mute_hours() -> i64 {
    24
}
fn default_probe_chat_id() -> i64 {
    1_234_567_890
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_settings_refresh_secs() -> u64 {
    300
}
fn default_group_idle_days() -> i64 {
    5
}

impl TriageConfig {
    /// Load config from a TOML file with TRIAGE_* env var overrides.
    ///
    /// Any numeric field that fails typed extraction (e.g. a non-integer
    /// poll interval from the environment) aborts startup here.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("triage.toml");

        let config: TriageConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("TRIAGE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}
