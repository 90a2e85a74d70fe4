use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::store::Store;
use crate::types::BotSettings;

/// Read-through cache over the `bot_settings` row.
///
/// The row is edited externally while the bot runs, so values are re-read
/// after `ttl`. When the row is missing or the read fails, the injected
/// fallback (from config) is served instead.
pub struct SettingsCache {
    store: Store,
    ttl: Duration,
    fallback: BotSettings,
    inner: Mutex<Option<(Instant, BotSettings)>>,
}

impl SettingsCache {
    pub fn new(store: Store, ttl: Duration, fallback: BotSettings) -> Self {
        Self {
            store,
            ttl,
            fallback,
            inner: Mutex::new(None),
        }
    }

    pub fn get(&self) -> BotSettings {
        let mut inner = self.inner.lock().unwrap();
        if let Some((read_at, settings)) = inner.as_ref() {
            if read_at.elapsed() < self.ttl {
                return settings.clone();
            }
        }
        let settings = match self.store.bot_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => self.fallback.clone(),
            Err(e) => {
                warn!(error = %e, "bot_settings read failed, serving fallback");
                self.fallback.clone()
            }
        };
        *inner = Some((Instant::now(), settings.clone()));
        settings
    }

    /// The support handle with a leading `@`, however it was stored.
    pub fn support_handle(&self) -> String {
        let raw = self.get().support_username;
        if raw.starts_with('@') {
            raw
        } else {
            format!("@{raw}")
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;

    fn fallback() -> BotSettings {
        BotSettings {
            bot_username: "cfg_bot".into(),
            support_username: "cfg_support".into(),
        }
    }

    #[test]
    fn serves_fallback_when_row_missing() {
        let store = Store::new(Connection::open_in_memory().unwrap()).unwrap();
        let cache = SettingsCache::new(store, Duration::from_secs(60), fallback());
        assert_eq!(cache.get().bot_username, "cfg_bot");
        assert_eq!(cache.support_handle(), "@cfg_support");
    }

    #[test]
    fn caches_until_ttl_then_rereads() {
        let store = Store::new(Connection::open_in_memory().unwrap()).unwrap();
        // Zero TTL: every read goes to the store.
        let cache = SettingsCache::new(store.clone(), Duration::ZERO, fallback());
        assert_eq!(cache.get().support_username, "cfg_support");

        store
            .conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO bot_settings (id, bot_username, support_username)
                 VALUES (1, 'shop', '@ops')",
                [],
            )
            .unwrap();
        assert_eq!(cache.get().support_username, "@ops");
        assert_eq!(cache.support_handle(), "@ops");

        // Long TTL: stale value is served even after the row changes.
        let cache = SettingsCache::new(store.clone(), Duration::from_secs(600), fallback());
        assert_eq!(cache.get().bot_username, "shop");
        store
            .conn
            .lock()
            .unwrap()
            .execute("UPDATE bot_settings SET bot_username = 'renamed'", [])
            .unwrap();
        assert_eq!(cache.get().bot_username, "shop");
    }
}
