//! Subroutine A: first-touch categorization of a fresh ticket.

use std::sync::Arc;

use tracing::{error, info, warn};

use triage_core::catalog::{
    is_audio_placeholder, is_emoji_only, is_silent_placeholder, is_visual_placeholder,
};
use triage_core::{Action, Category, Lang, Template};
use triage_store::{StoredMessage, TicketWithMessages};
use triage_telegram::probe;

use crate::engine::EngineCtx;
use crate::error::Result;
use crate::handlers;
use crate::prompts;

/// Task entry point; failures abort this ticket only.
pub async fn categorize_ticket(ctx: Arc<EngineCtx>, tw: TicketWithMessages) {
    let ticket_id = tw.ticket.ticket_id;
    if let Err(e) = run(&ctx, tw).await {
        error!(ticket_id, error = %e, "categorize task failed");
    }
}

async fn run(ctx: &EngineCtx, tw: TicketWithMessages) -> Result<()> {
    let ticket_id = tw.ticket.ticket_id;
    let user_id = tw.ticket.user_id;

    let batch = surviving_messages(ctx, &tw.messages).await?;
    if batch.is_empty() {
        return Ok(());
    }

    // Spam shield: flag the ticket away from the poller and mute.
    if batch.len() > ctx.config.engine.spam_threshold {
        ctx.store.set_messages_forwarded(ticket_id)?;
        ctx.store
            .mute_for_hours(user_id, ctx.config.engine.mute_hours)?;
        info!(user_id, count = batch.len(), "spam shield tripped, user muted");
        return Ok(());
    }

    let texts: Vec<&str> = batch.iter().map(|m| m.user_text.as_str()).collect();

    // Content-only shortcuts — no classifier involved.
    if texts.iter().all(|t| is_visual_placeholder(t)) {
        ctx.store
            .set_lang_and_category(ticket_id, Category::Other.key(), Lang::Other.code())?;
        ctx.escalator.escalate(user_id, ticket_id).await;
        return Ok(());
    }
    if texts.iter().all(|t| is_audio_placeholder(t)) {
        ctx.store.set_lang_and_category(
            ticket_id,
            Category::VoiceMessage.key(),
            Lang::Other.code(),
        )?;
        let previous = ctx.store.previous_category_key(user_id)?;
        ctx.store.close_ticket(ticket_id)?;
        let previous_was_voice = previous
            .as_deref()
            .and_then(Category::from_key)
            .map(|c| c == Category::VoiceMessage)
            .unwrap_or(false);
        if !previous_was_voice {
            handlers::run_template(ctx, Template::VoiceMessage, user_id, ticket_id, Lang::Other)
                .await?;
        }
        return Ok(());
    }
    if texts
        .iter()
        .all(|t| is_emoji_only(t) || is_silent_placeholder(t))
    {
        ctx.store.close_ticket(ticket_id)?;
        info!(ticket_id, "emoji/sticker-only ticket closed silently");
        return Ok(());
    }

    // Ask the model, then validate everything it said.
    let prompt = prompts::lang_category_prompt(&texts);
    let raw = ctx.classifier.classify(&prompt).await;
    let (lang, category) = match prompts::parse_lang_category(&raw) {
        Some(pair) => pair,
        None => {
            warn!(ticket_id, raw = %raw, "unexpected classifier output shape");
            (Lang::Other, Category::Other)
        }
    };
    info!(ticket_id, lang = %lang, category = %category, "ticket classified");

    // Anti-loop: a template-only question that would get the exact same
    // reply as the user's previous ticket closes silently. Compared at the
    // action level so the thanks-family categories count as one.
    if category.is_template_only() {
        if let Some(previous) = ctx.store.previous_category_key(user_id)? {
            let same_reply = Category::from_key(&previous)
                .map(|prev| prev.action() == category.action())
                .unwrap_or(false);
            if same_reply {
                ctx.store.close_ticket(ticket_id)?;
                info!(user_id, category = %category, "repeat question suppressed");
                return Ok(());
            }
        }
    }

    ctx.store
        .set_lang_and_category(ticket_id, category.key(), lang.code())?;

    // Lost drop reported with proof attached: straight to a human.
    if category == Category::CantFindDrop && texts.iter().any(|t| is_visual_placeholder(t)) {
        ctx.escalator.escalate(user_id, ticket_id).await;
        return Ok(());
    }

    match category.action() {
        Action::Template(template) => {
            handlers::run_template(ctx, template, user_id, ticket_id, lang).await?
        }
        Action::Escalate => ctx.escalator.escalate(user_id, ticket_id).await,
    }
    Ok(())
}

/// Probe each message against the platform; deleted ones are flagged in
/// the repository and dropped from the batch.
pub(crate) async fn surviving_messages(
    ctx: &EngineCtx,
    messages: &[StoredMessage],
) -> Result<Vec<StoredMessage>> {
    let mut surviving = Vec::with_capacity(messages.len());
    for msg in messages {
        let deleted = probe::is_message_deleted(
            &ctx.bot,
            ctx.config.engine.probe_chat_id,
            msg.user_id,
            msg.message_id,
        )
        .await;
        if deleted {
            ctx.store.mark_message_deleted(msg.id)?;
            continue;
        }
        surviving.push(msg.clone());
    }
    Ok(surviving)
}
