//! HTTP connector for the local session-bridge daemon.
//!
//! The bridge owns the MTProto sessions; this client opens one per worker
//! identity and invokes group operations against it. Every call is a JSON
//! POST; errors carry the bridge's message verbatim.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::api::{Connect, UserApi};
use crate::error::{Result, WorkerError};
use crate::identity::{ProxyDescriptor, WorkerIdentity};

pub struct BridgeConnector {
    client: reqwest::Client,
    base_url: String,
}

impl BridgeConnector {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct OpenResponse {
    session: String,
    authorized: bool,
}

#[derive(Deserialize)]
struct InvokeResponse {
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl Connect for BridgeConnector {
    async fn connect(
        &self,
        identity: &WorkerIdentity,
        proxy: &ProxyDescriptor,
    ) -> Result<Box<dyn UserApi>> {
        let resp = self
            .client
            .post(format!("{}/sessions/open", self.base_url))
            .json(&json!({
                "session_path": identity.session_path,
                "api_id": identity.api_id,
                "api_hash": identity.api_hash,
                "proxy_url": proxy.url(),
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(WorkerError::Bridge(format!("open failed ({status}): {message}")));
        }

        let open: OpenResponse = resp
            .json()
            .await
            .map_err(|e| WorkerError::Bridge(e.to_string()))?;

        Ok(Box::new(BridgeSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session: open.session,
            authorized: open.authorized,
        }))
    }
}

/// One open session on the bridge.
pub struct BridgeSession {
    client: reqwest::Client,
    base_url: String,
    session: String,
    authorized: bool,
}

impl BridgeSession {
    async fn invoke(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}/sessions/{}/invoke", self.base_url, self.session))
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(WorkerError::Bridge(format!(
                "{method} failed ({status}): {message}"
            )));
        }

        let invoked: InvokeResponse = resp
            .json()
            .await
            .map_err(|e| WorkerError::Bridge(e.to_string()))?;
        if !invoked.ok {
            return Err(WorkerError::Bridge(
                invoked.error.unwrap_or_else(|| format!("{method} failed")),
            ));
        }
        Ok(invoked.result)
    }

    fn result_i64(value: &serde_json::Value, key: &str) -> Result<i64> {
        value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| WorkerError::Bridge(format!("missing '{key}' in bridge result")))
    }
}

#[async_trait]
impl UserApi for BridgeSession {
    async fn is_authorized(&self) -> Result<bool> {
        Ok(self.authorized)
    }

    async fn resolve_username(&self, username: &str) -> Result<i64> {
        let result = self
            .invoke("resolve_username", json!({ "username": username }))
            .await?;
        Self::result_i64(&result, "peer_id")
    }

    async fn create_group(&self, title: &str, members: &[i64]) -> Result<i64> {
        let result = self
            .invoke("create_group", json!({ "title": title, "members": members }))
            .await?;
        Self::result_i64(&result, "group_id")
    }

    async fn edit_group_title(&self, group_id: i64, title: &str) -> Result<()> {
        self.invoke(
            "edit_group_title",
            json!({ "group_id": group_id, "title": title }),
        )
        .await
        .map(|_| ())
    }

    async fn promote_admin(&self, group_id: i64, member: i64) -> Result<()> {
        self.invoke(
            "promote_admin",
            json!({ "group_id": group_id, "member": member }),
        )
        .await
        .map(|_| ())
    }

    async fn set_group_about(&self, group_id: i64, about: &str) -> Result<()> {
        self.invoke(
            "set_group_about",
            json!({ "group_id": group_id, "about": about }),
        )
        .await
        .map(|_| ())
    }

    async fn set_group_photo(&self, group_id: i64, photo: &Path) -> Result<()> {
        self.invoke(
            "set_group_photo",
            json!({ "group_id": group_id, "photo_path": photo }),
        )
        .await
        .map(|_| ())
    }

    async fn delete_group(&self, group_id: i64) -> Result<()> {
        self.invoke("delete_group", json!({ "group_id": group_id }))
            .await
            .map(|_| ())
    }

    async fn disconnect(&self) {
        let url = format!("{}/sessions/{}/close", self.base_url, self.session);
        if let Err(e) = self.client.post(url).send().await {
            warn!(session = %self.session, error = %e, "bridge session close failed");
        }
    }
}
