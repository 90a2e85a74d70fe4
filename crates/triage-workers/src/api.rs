use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::{ProxyDescriptor, WorkerIdentity};

/// A connected user-API session for one worker identity.
///
/// Group ids here are the platform's raw (positive) chat ids; the negated
/// convention used in storage is applied by the callers. Implementations
/// must be safe to `disconnect` more than once.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// Whether the on-disk session is signed in.
    async fn is_authorized(&self) -> Result<bool>;

    /// Resolve a public `@username` to a peer id.
    async fn resolve_username(&self, username: &str) -> Result<i64>;

    /// Create a private group with the given members; returns the raw id.
    async fn create_group(&self, title: &str, members: &[i64]) -> Result<i64>;

    async fn edit_group_title(&self, group_id: i64, title: &str) -> Result<()>;

    /// Grant a member admin rights in the group.
    async fn promote_admin(&self, group_id: i64, member: i64) -> Result<()>;

    /// Set the group "about" text.
    async fn set_group_about(&self, group_id: i64, about: &str) -> Result<()>;

    /// Upload a local image and set it as the group photo.
    async fn set_group_photo(&self, group_id: i64, photo: &Path) -> Result<()>;

    async fn delete_group(&self, group_id: i64) -> Result<()>;

    /// Tear the session down. Never fails; errors are logged.
    async fn disconnect(&self);
}

/// Opens user-API sessions. One implementation per transport; tests use
/// in-memory fakes.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(
        &self,
        identity: &WorkerIdentity,
        proxy: &ProxyDescriptor,
    ) -> Result<Box<dyn UserApi>>;
}
