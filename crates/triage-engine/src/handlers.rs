//! Template handlers: the scripted replies the dispatch table selects.
//!
//! Handlers are pure data plus sends; none of them escalates on its own —
//! escalation is a separate sentinel the engine resolves directly.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::info;

use triage_core::{Lang, Template};

use crate::engine::EngineCtx;
use crate::error::Result;
use crate::replies;

pub async fn run_template(
    ctx: &EngineCtx,
    template: Template,
    user_id: i64,
    ticket_id: i64,
    lang: Lang,
) -> Result<()> {
    let to = ChatId(user_id);
    match template {
        Template::GatherDropInfo => {
            // Ticket stays open: the re-engage pass reads the answer.
            let [first, second, third] = replies::gather_drop_info(lang);
            ctx.bot.send_message(to, first).await?;
            pause().await;
            ctx.bot.send_message(to, second).await?;
            pause().await;
            ctx.bot.send_message(to, third).await?;
        }
        Template::PaymentHelp => {
            ctx.store.close_ticket(ticket_id)?;
            ctx.bot
                .send_message(to, replies::CRYPTO_GUIDE)
                .parse_mode(ParseMode::Html)
                .await?;
            let data_dir = Path::new(&ctx.config.engine.data_dir);
            ctx.bot
                .send_photo(to, InputFile::file(data_dir.join("card_payment_1.jpg")))
                .caption(replies::CARD_GUIDE_CAPTION)
                .parse_mode(ParseMode::Html)
                .await?;
            ctx.bot
                .send_photo(to, InputFile::file(data_dir.join("card_payment_2.jpg")))
                .await?;
            pause().await;
            ctx.bot
                .send_message(to, replies::PAYMENT_WARNING)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Template::RestockInfo => {
            ctx.store.close_ticket(ticket_id)?;
            ctx.bot.send_message(to, replies::restock_info(lang)).await?;
        }
        Template::ProductAvailability => {
            ctx.store.close_ticket(ticket_id)?;
            let bot_username = ctx.settings.get().bot_username;
            let [first, second] = replies::product_availability(lang, &bot_username);
            ctx.bot.send_message(to, first).await?;
            pause().await;
            ctx.bot.send_message(to, second).await?;
        }
        Template::ArrivalTime => {
            ctx.store.close_ticket(ticket_id)?;
            ctx.bot.send_message(to, replies::arrival_time(lang)).await?;
        }
        Template::Thanks => {
            ctx.bot.send_message(to, replies::THUMBS_UP).await?;
            ctx.store.close_ticket(ticket_id)?;
        }
        Template::VoiceMessage => {
            // The caller has already closed the ticket.
            let [first, second] = replies::voice_nudge();
            ctx.bot.send_message(to, first).await?;
            pause().await;
            ctx.bot.send_message(to, second).await?;
        }
    }
    info!(user_id, ticket_id, ?template, "template reply sent");
    Ok(())
}

/// Typing-speed gap between consecutive scripted messages.
async fn pause() {
    let secs = rand::rng().random_range(4.0..6.0);
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
