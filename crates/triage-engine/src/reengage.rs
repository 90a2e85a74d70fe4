//! Subroutine B: re-engagement on an already-categorized ticket.
//!
//! Only the lost-drop category keeps a ticket open after its first
//! scripted reply; everything else is either closed or with operators by
//! the time this runs.

use std::sync::Arc;

use chrono::Timelike;
use chrono_tz::Europe::Helsinki;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use triage_core::catalog::is_visual_placeholder;
use triage_core::{Category, Lang, Template};
use triage_store::TicketWithMessages;

use crate::engine::EngineCtx;
use crate::error::Result;
use crate::handlers;
use crate::prompts::{self, Verdict};
use crate::replies;

/// Task entry point; failures abort this ticket only.
pub async fn reengage_ticket(ctx: Arc<EngineCtx>, tw: TicketWithMessages) {
    let ticket_id = tw.ticket.ticket_id;
    if let Err(e) = run(&ctx, tw).await {
        error!(ticket_id, error = %e, "re-engage task failed");
    }
}

async fn run(ctx: &EngineCtx, tw: TicketWithMessages) -> Result<()> {
    let ticket_id = tw.ticket.ticket_id;
    let user_id = tw.ticket.user_id;

    let category = tw
        .ticket
        .support_issue
        .as_deref()
        .and_then(Category::from_key);
    if category != Some(Category::CantFindDrop) {
        debug!(ticket_id, issue = ?tw.ticket.support_issue, "no re-engage flow for this category");
        return Ok(());
    }
    let lang = tw
        .ticket
        .lang
        .as_deref()
        .map(Lang::from_code)
        .unwrap_or(Lang::Other);

    // The snapshot predates the poller's mark-replied write, so the
    // replied flags still partition this batch into read and unread.
    let batch = super::categorize::surviving_messages(ctx, &tw.messages).await?;
    let unread: Vec<&str> = batch
        .iter()
        .filter(|m| !m.replied)
        .map(|m| m.user_text.as_str())
        .collect();
    if unread.is_empty() {
        return Ok(());
    }

    if batch.len() > ctx.config.engine.spam_threshold {
        ctx.store.set_messages_forwarded(ticket_id)?;
        ctx.store
            .mute_for_hours(user_id, ctx.config.engine.mute_hours)?;
        info!(user_id, count = batch.len(), "spam shield tripped, user muted");
        return Ok(());
    }

    // Proof attached: acknowledge and hand over.
    if unread.iter().any(|t| is_visual_placeholder(t)) {
        send_courier_ack(ctx, user_id, lang).await?;
        ctx.escalator.escalate(user_id, ticket_id).await;
        return Ok(());
    }

    // No media — is the user still complaining, or done?
    let prompt = prompts::complaint_prompt(&unread);
    let raw = ctx.classifier.classify(&prompt).await;
    match prompts::parse_verdict(&raw) {
        Verdict::Complaint => {
            send_courier_ack(ctx, user_id, lang).await?;
            ctx.escalator.escalate(user_id, ticket_id).await;
        }
        Verdict::Resolved => {
            handlers::run_template(ctx, Template::Thanks, user_id, ticket_id, lang).await?;
        }
    }
    Ok(())
}

/// "We will check with our couriers", plus the late/early caveat when the
/// local (Europe/Helsinki) wall clock warrants one.
async fn send_courier_ack(ctx: &EngineCtx, user_id: i64, lang: Lang) -> Result<()> {
    ctx.bot
        .send_message(ChatId(user_id), replies::courier_check(lang))
        .await?;
    let hour = chrono::Utc::now().with_timezone(&Helsinki).hour();
    if replies::is_late_or_early(hour) {
        ctx.bot
            .send_message(ChatId(user_id), replies::time_caveat(lang, hour))
            .await?;
    }
    Ok(())
}
