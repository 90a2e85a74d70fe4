//! `triage-workers` — the worker-identity pool.
//!
//! Worker identities are user-API accounts (credentials + on-disk session
//! blob + sticky egress proxy) used to create and administer operator
//! groups. The pool enumerates them from disk, enforces a per-identity
//! group-creation quota and hands out connected sessions as leased
//! resources the caller must release.
//!
//! The user-API transport itself is behind the [`UserApi`] / [`Connect`]
//! seam; the in-tree implementation talks to a local session-bridge
//! daemon over HTTP.

pub mod api;
pub mod bridge;
pub mod error;
pub mod identity;
pub mod pool;

pub use api::{Connect, UserApi};
pub use bridge::BridgeConnector;
pub use error::WorkerError;
pub use identity::{ProxyDescriptor, WorkerIdentity};
pub use pool::{LeasedWorker, WorkerPool};
