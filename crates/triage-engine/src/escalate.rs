//! Escalation orchestrator: hand a ticket to human operators.

use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, Recipient};
use tracing::{error, info, warn};

use triage_core::TriageConfig;
use triage_store::{SettingsCache, Store, UserRecord};
use triage_telegram::keyboards;
use triage_workers::{LeasedWorker, WorkerPool};

use crate::dossier;
use crate::error::Result;

pub struct Escalator {
    store: Store,
    bot: Bot,
    pool: WorkerPool,
    settings: Arc<SettingsCache>,
    config: TriageConfig,
}

impl Escalator {
    pub fn new(
        store: Store,
        bot: Bot,
        pool: WorkerPool,
        settings: Arc<SettingsCache>,
        config: TriageConfig,
    ) -> Self {
        Self {
            store,
            bot,
            pool,
            settings,
            config,
        }
    }

    /// Forward a ticket into the user's operator group, creating the group
    /// first when needed. Absorbs every failure: an escalation that cannot
    /// proceed posts an operational notice to the support handle and
    /// aborts only itself.
    pub async fn escalate(&self, user_id: i64, ticket_id: i64) {
        let worker = match self.pool.acquire_for_group_creation().await {
            Ok(worker) => worker,
            Err(e) => {
                error!(user_id, ticket_id, error = %e, "no worker identity for escalation");
                self.notify_support(&format!(
                    "ERROR: Failed to forward ticket to operators - no usable worker \
                     identity (all at group limit, unauthorized or failing).\n{e}"
                ))
                .await;
                return;
            }
        };

        let result = self.forward(&worker, user_id, ticket_id).await;
        // The lease is released on success and failure alike.
        worker.release().await;

        if let Err(e) = result {
            error!(user_id, ticket_id, error = %e, "escalation failed");
            self.notify_support(&format!(
                "ERROR FORWARDING TICKET {ticket_id} FOR USER {user_id}:\n{e}"
            ))
            .await;
        }
    }

    async fn forward(&self, worker: &LeasedWorker, user_id: i64, ticket_id: i64) -> Result<()> {
        let Some(user) = self.store.user_by_id(user_id)? else {
            warn!(user_id, "escalation for a user the repository has never seen");
            return Ok(());
        };

        let group_id = match self.store.group_binding(user_id)? {
            Some(binding) => {
                self.refresh_title(worker, binding.group_id, &user).await;
                binding.group_id
            }
            None => self.create_group(worker, &user).await?,
        };

        self.store.set_messages_forwarded(ticket_id)?;
        let Some(tw) = self.store.ticket_with_messages(ticket_id)? else {
            return Ok(());
        };

        dossier::post(&self.bot, &self.store, user_id, group_id).await;

        let topic = tw
            .ticket
            .support_issue
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        self.bot
            .send_message(
                ChatId(group_id),
                format!(
                    "<b>Ticket topic:</b> '{topic}'\n\n\
                     NOTE: You can't edit or delete the messages you send to user"
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::close_ticket(ticket_id))
            .await?;

        let mut messages = tw.messages;
        messages.sort_by_key(|m| m.created_at);
        for msg in messages {
            if msg.is_deleted {
                // The platform no longer holds it; operators still get the text.
                if let Err(e) = self
                    .bot
                    .send_message(
                        ChatId(group_id),
                        format!("(DELETED MESSAGE)\n{}", msg.user_text),
                    )
                    .await
                {
                    warn!(message_id = msg.message_id, error = %e, "deleted-message note failed");
                }
            } else if let Err(e) = self
                .bot
                .forward_message(
                    ChatId(group_id),
                    ChatId(user_id),
                    MessageId(msg.message_id as i32),
                )
                .await
            {
                warn!(message_id = msg.message_id, error = %e, "message copy into group failed");
            }
        }

        info!(user_id, group_id, ticket_id, "ticket forwarded to operators");
        Ok(())
    }

    /// Users rename themselves; keep the reused group's title current.
    async fn refresh_title(&self, worker: &LeasedWorker, group_id: i64, user: &UserRecord) {
        let title = user.display_name();
        if title.is_empty() {
            return;
        }
        if let Err(e) = worker.api().edit_group_title(group_id.abs(), &title).await {
            warn!(group_id, error = %e, "group retitle failed");
        }
    }

    async fn create_group(&self, worker: &LeasedWorker, user: &UserRecord) -> Result<i64> {
        let mut title = user.display_name();
        if title.is_empty() {
            title = format!("User {}", user.user_id);
        }

        let api = worker.api();
        let bot_peer = api.resolve_username(&self.config.bot.username).await?;
        let admin_username = if self.config.support.development_mode {
            self.config.support.admin_username.clone()
        } else {
            self.settings.get().support_username
        };
        let admin_peer = api
            .resolve_username(admin_username.trim_start_matches('@'))
            .await?;

        let raw_id = api.create_group(&title, &[bot_peer, admin_peer]).await?;
        // Stored negated, the platform convention for group chat ids.
        let group_id = -raw_id;

        // Admin rights survive the worker identity getting banned.
        api.promote_admin(raw_id, admin_peer).await?;

        // The about field is how operator replies find their user.
        if let Err(e) = api.set_group_about(raw_id, &user.user_id.to_string()).await {
            warn!(group_id, error = %e, "group about update failed");
        }

        let photo = Path::new(&self.config.engine.data_dir).join("warning.jpg");
        if let Err(e) = api.set_group_photo(raw_id, &photo).await {
            warn!(group_id, error = %e, "group photo upload failed");
        }

        self.store
            .upsert_group_binding(user.user_id, group_id, &worker.identity.name)?;
        info!(
            user_id = user.user_id,
            group_id,
            identity = %worker.identity.name,
            "operator group created"
        );
        Ok(group_id)
    }

    async fn notify_support(&self, text: &str) {
        let handle = self.settings.support_handle();
        if let Err(e) = self
            .bot
            .send_message(Recipient::ChannelUsername(handle), text)
            .await
        {
            error!(error = %e, "support notice failed");
        }
    }
}
