//! Private-chat ingress: new messages and edits.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use triage_store::TicketFilter;

use crate::content;
use crate::context::IngressContext;
use crate::welcome;

/// Route one inbound private message.
///
/// Muted users are dropped silently. Command-like messages go to the
/// welcome handler and are never persisted as ticket events. Everything
/// else lands under the user's open ticket; when that ticket is already
/// forwarded to operators the message is also relayed into the group and
/// stored as replied so the engine leaves it alone.
pub async fn handle_private_message(
    bot: Bot,
    msg: Message,
    ctx: Arc<IngressContext>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }
    let user_id = from.id.0 as i64;

    match ctx.store.is_muted(user_id) {
        Ok(true) => return Ok(()),
        Ok(false) => {}
        Err(e) => {
            warn!(user_id, error = %e, "mute check failed, dropping event");
            return Ok(());
        }
    }

    // Keep display fields fresh — the dossier and group titles read them.
    if let Err(e) = ctx.store.upsert_user(
        user_id,
        from.username.as_deref(),
        Some(&from.first_name),
        from.last_name.as_deref(),
    ) {
        warn!(user_id, error = %e, "user upsert failed");
    }

    let text = msg.text().unwrap_or("");
    if text.starts_with('/') || welcome::is_similar_to_start(text) {
        return welcome::handle_start(bot, msg, ctx).await;
    }

    let content = content::content_text(&msg);
    let message_id = msg.id.0 as i64;

    let has_forwarded_open_ticket = ctx
        .store
        .active_tickets(&TicketFilter {
            forwarded: Some(true),
            user_id: Some(user_id),
        })
        .map(|tickets| !tickets.is_empty())
        .unwrap_or_else(|e| {
            warn!(user_id, error = %e, "forwarded-ticket lookup failed");
            false
        });

    if has_forwarded_open_ticket {
        // Operators are already on this ticket — relay, don't re-engage.
        match ctx.store.group_binding(user_id) {
            Ok(Some(binding)) => {
                if let Err(e) = bot
                    .forward_message(ChatId(binding.group_id), msg.chat.id, msg.id)
                    .await
                {
                    warn!(user_id, group_id = binding.group_id, error = %e, "relay into group failed");
                }
            }
            Ok(None) => {
                warn!(user_id, "forwarded ticket has no group binding");
            }
            Err(e) => {
                warn!(user_id, error = %e, "group binding lookup failed");
            }
        }
        if let Err(e) = ctx
            .store
            .append_user_message(user_id, message_id, &content, true)
        {
            warn!(user_id, error = %e, "message append failed");
        }
    } else if let Err(e) = ctx
        .store
        .append_user_message(user_id, message_id, &content, false)
    {
        warn!(user_id, error = %e, "message append failed");
    }

    info!(user_id, first_name = %from.first_name, %content, "message recorded");
    Ok(())
}

/// Route one edited private message.
///
/// While the stored copy is unreplied the edit overwrites it in place;
/// once the ticket is with operators the group gets an edit notice
/// instead.
pub async fn handle_edited_message(
    bot: Bot,
    msg: Message,
    ctx: Arc<IngressContext>,
) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    if ctx.store.is_muted(user_id).unwrap_or(false) {
        return Ok(());
    }

    let new_text = content::content_text(&msg);
    let stored = match ctx.store.message_by_platform_id(user_id, msg.id.0 as i64) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Ok(()), // not a tracked ticket message
        Err(e) => {
            warn!(user_id, error = %e, "edit lookup failed");
            return Ok(());
        }
    };

    if stored.ticket.messages_forwarded {
        match ctx.store.group_binding(user_id) {
            Ok(Some(binding)) => {
                bot.send_message(
                    ChatId(binding.group_id),
                    format!("(EDITED MESSAGE)\n{new_text}"),
                )
                .await?;
            }
            Ok(None) => warn!(user_id, "edited forwarded message has no group binding"),
            Err(e) => warn!(user_id, error = %e, "group binding lookup failed"),
        }
        return Ok(());
    }

    match ctx
        .store
        .update_edited_message(user_id, msg.id.0 as i64, &new_text)
    {
        Ok(true) => info!(user_id, message_id = msg.id.0, "edit stored"),
        // Already replied — the engine has consumed the original text.
        Ok(false) => {}
        Err(e) => warn!(user_id, error = %e, "edit update failed"),
    }
    Ok(())
}
