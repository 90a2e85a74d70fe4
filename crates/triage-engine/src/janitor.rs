//! Nightly sweep of idle operator groups.
//!
//! A group is reaped when its user has no open ticket and their newest
//! ticket is older than the idle cutoff. Deletion goes through the same
//! worker identity that created the group.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, warn};

use triage_store::{GroupBinding, Store};
use triage_workers::WorkerPool;

use crate::error::Result;

/// Daily run time, UTC.
const RUN_HOUR_UTC: u32 = 3;
/// Pause after a failed sweep before rescheduling.
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(300);

pub struct Janitor {
    store: Store,
    pool: WorkerPool,
    idle_days: i64,
}

impl Janitor {
    pub fn new(store: Store, pool: WorkerPool, idle_days: i64) -> Self {
        Self {
            store,
            pool,
            idle_days,
        }
    }

    /// Sleep until 03:00 UTC, sweep, repeat. Interruptible at the sleep.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("janitor started");
        loop {
            let wait = sleep_until_next_run(Utc::now());
            info!(seconds = wait.as_secs(), "janitor sleeping until next 03:00 UTC run");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.sweep().await {
                        error!("janitor sweep error: {e}");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("janitor shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One pass over every group binding. Idempotent: a second run with no
    /// newly-idle groups deletes nothing.
    pub async fn sweep(&self) -> Result<()> {
        let cutoff = Utc::now() - chrono::Duration::days(self.idle_days);
        for binding in self.store.all_group_bindings()? {
            if let Err(e) = self.sweep_one(&binding, cutoff).await {
                error!(
                    user_id = binding.user_id,
                    group_id = binding.group_id,
                    error = %e,
                    "binding sweep failed"
                );
            }
        }
        Ok(())
    }

    async fn sweep_one(&self, binding: &GroupBinding, cutoff: DateTime<Utc>) -> Result<()> {
        if !self.store.open_tickets(binding.user_id)?.is_empty() {
            return Ok(());
        }
        // No ticket history at all also means skip.
        let Some(latest) = self.store.latest_ticket_date(binding.user_id)? else {
            return Ok(());
        };
        if latest > cutoff {
            return Ok(());
        }

        let worker = match self.pool.by_name(&binding.created_by).await {
            Ok(worker) => worker,
            Err(e) => {
                warn!(
                    identity = %binding.created_by,
                    group_id = binding.group_id,
                    error = %e,
                    "janitor cannot open creator session"
                );
                return Ok(());
            }
        };
        let deleted = worker.api().delete_group(binding.group_id.abs()).await;
        worker.release().await;

        match deleted {
            Ok(()) => {
                self.store.delete_group_binding(binding.user_id)?;
                info!(
                    user_id = binding.user_id,
                    group_id = binding.group_id,
                    "idle operator group deleted"
                );
            }
            Err(e) => warn!(group_id = binding.group_id, error = %e, "group delete failed"),
        }
        Ok(())
    }
}

/// Duration from `now` to the next 03:00 UTC.
pub(crate) fn sleep_until_next_run(now: DateTime<Utc>) -> std::time::Duration {
    let today = now
        .date_naive()
        .and_hms_opt(RUN_HOUR_UTC, 0, 0)
        .expect("valid wall-clock time")
        .and_utc();
    let target = if now >= today {
        today + chrono::Duration::days(1)
    } else {
        today
    };
    (target - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use triage_core::config::{ProxyConfig, WorkersConfig};
    use triage_workers::{Connect, ProxyDescriptor, UserApi, WorkerIdentity};

    use super::*;

    #[test]
    fn next_run_is_today_before_three_utc() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(sleep_until_next_run(now).as_secs(), 90 * 60);
    }

    #[test]
    fn next_run_rolls_to_tomorrow_at_or_after_three_utc() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        assert_eq!(sleep_until_next_run(now).as_secs(), 24 * 3600);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(sleep_until_next_run(now).as_secs(), 15 * 3600);
    }

    #[derive(Default)]
    struct FakeState {
        deleted_groups: Vec<i64>,
        fail_delete: bool,
        unauthorized: HashMap<String, bool>,
    }

    struct FakeConnect {
        state: Arc<Mutex<FakeState>>,
    }

    struct FakeApi {
        authorized: bool,
        state: Arc<Mutex<FakeState>>,
    }

    #[async_trait]
    impl Connect for FakeConnect {
        async fn connect(
            &self,
            identity: &WorkerIdentity,
            _proxy: &ProxyDescriptor,
        ) -> triage_workers::error::Result<Box<dyn UserApi>> {
            let authorized = !self
                .state
                .lock()
                .unwrap()
                .unauthorized
                .get(&identity.name)
                .copied()
                .unwrap_or(false);
            Ok(Box::new(FakeApi {
                authorized,
                state: Arc::clone(&self.state),
            }))
        }
    }

    #[async_trait]
    impl UserApi for FakeApi {
        async fn is_authorized(&self) -> triage_workers::error::Result<bool> {
            Ok(self.authorized)
        }
        async fn resolve_username(&self, _u: &str) -> triage_workers::error::Result<i64> {
            Ok(1)
        }
        async fn create_group(
            &self,
            _t: &str,
            _m: &[i64],
        ) -> triage_workers::error::Result<i64> {
            Ok(100)
        }
        async fn edit_group_title(&self, _g: i64, _t: &str) -> triage_workers::error::Result<()> {
            Ok(())
        }
        async fn promote_admin(&self, _g: i64, _m: i64) -> triage_workers::error::Result<()> {
            Ok(())
        }
        async fn set_group_about(&self, _g: i64, _a: &str) -> triage_workers::error::Result<()> {
            Ok(())
        }
        async fn set_group_photo(&self, _g: i64, _p: &Path) -> triage_workers::error::Result<()> {
            Ok(())
        }
        async fn delete_group(&self, group_id: i64) -> triage_workers::error::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_delete {
                return Err(triage_workers::WorkerError::Bridge("boom".into()));
            }
            state.deleted_groups.push(group_id);
            Ok(())
        }
        async fn disconnect(&self) {}
    }

    fn fixture(state: Arc<Mutex<FakeState>>, idle_days: i64) -> (Janitor, Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("+371000001.session"), b"blob").unwrap();
        std::fs::write(
            dir.path().join("+371000001.json"),
            r#"{"app_id": 1, "app_hash": "h"}"#,
        )
        .unwrap();

        let store = Store::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap();
        let config = WorkersConfig {
            sessions_dir: dir.path().display().to_string(),
            group_limit: 45,
            bridge_url: String::new(),
            proxy: ProxyConfig::default(),
        };
        let pool = WorkerPool::new(&config, store.clone(), Arc::new(FakeConnect { state }));
        (Janitor::new(store.clone(), pool, idle_days), store, dir)
    }

    // idle_days = -1 puts the cutoff in the future, so freshly created
    // tickets already count as idle.
    #[tokio::test]
    async fn sweep_deletes_idle_group_and_binding_once() {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (janitor, store, _dir) = fixture(Arc::clone(&state), -1);

        let ticket_id = store.append_user_message(555, 1, "old issue", false).unwrap();
        store.close_ticket(ticket_id).unwrap();
        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert_eq!(state.lock().unwrap().deleted_groups, vec![4242]);
        assert!(store.group_binding(555).unwrap().is_none());

        // Second run finds nothing to delete.
        janitor.sweep().await.unwrap();
        assert_eq!(state.lock().unwrap().deleted_groups.len(), 1);
    }

    #[tokio::test]
    async fn sweep_skips_users_with_open_tickets() {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (janitor, store, _dir) = fixture(Arc::clone(&state), -1);

        store.append_user_message(555, 1, "still talking", false).unwrap();
        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert!(state.lock().unwrap().deleted_groups.is_empty());
        assert!(store.group_binding(555).unwrap().is_some());
    }

    #[tokio::test]
    async fn sweep_skips_users_with_no_ticket_history() {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (janitor, store, _dir) = fixture(Arc::clone(&state), -1);

        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert!(state.lock().unwrap().deleted_groups.is_empty());
    }

    #[tokio::test]
    async fn recent_activity_is_left_alone() {
        let state = Arc::new(Mutex::new(FakeState::default()));
        // Real cutoff: 5 days back. The fresh ticket is newer than that.
        let (janitor, store, _dir) = fixture(Arc::clone(&state), 5);

        let ticket_id = store.append_user_message(555, 1, "recent", false).unwrap();
        store.close_ticket(ticket_id).unwrap();
        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert!(state.lock().unwrap().deleted_groups.is_empty());
        assert!(store.group_binding(555).unwrap().is_some());
    }

    #[tokio::test]
    async fn unauthorized_creator_session_is_skipped_with_binding_kept() {
        let state = Arc::new(Mutex::new(FakeState {
            unauthorized: HashMap::from([("+371000001".to_string(), true)]),
            ..Default::default()
        }));
        let (janitor, store, _dir) = fixture(Arc::clone(&state), -1);

        let ticket_id = store.append_user_message(555, 1, "old", false).unwrap();
        store.close_ticket(ticket_id).unwrap();
        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert!(state.lock().unwrap().deleted_groups.is_empty());
        assert!(store.group_binding(555).unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_binding() {
        let state = Arc::new(Mutex::new(FakeState {
            fail_delete: true,
            ..Default::default()
        }));
        let (janitor, store, _dir) = fixture(Arc::clone(&state), -1);

        let ticket_id = store.append_user_message(555, 1, "old", false).unwrap();
        store.close_ticket(ticket_id).unwrap();
        store.upsert_group_binding(555, -4242, "+371000001").unwrap();

        janitor.sweep().await.unwrap();
        assert!(store.group_binding(555).unwrap().is_some());
    }
}
