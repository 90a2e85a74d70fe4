//! Welcome / start handling.
//!
//! Users reach this on `/`-prefixed commands or anything fuzzy-matching
//! "start". Welcome traffic is never persisted as a ticket event.

use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{info, warn};

use crate::context::IngressContext;

/// Minimum Levenshtein ratio for a message to count as "start".
const START_SIMILARITY: f64 = 0.7;

/// Fuzzy check for start-like messages ("start", "Strat", "/start!").
pub fn is_similar_to_start(text: &str) -> bool {
    let cleaned = text
        .trim()
        .to_lowercase()
        .trim_start_matches(['/', '#', '!', '@', '$', '%', '&', '*'])
        .to_string();
    if cleaned.is_empty() {
        return false;
    }
    strsim::normalized_damerau_levenshtein(&cleaned, "start") >= START_SIMILARITY
}

fn rejection_text(bot_username: &str) -> String {
    format!(
        "🇬🇧 <b>Access Denied</b>\n\
         You must have an active order with @{bot_username} to use this support bot.\n\
         Please place an order first and then try again!\n\n\
         🇱🇻 <b>Piekļuve liegta</b>\n\
         Jums jābūt aktīvam pasūtījumam ar @{bot_username}, lai izmantotu šo atbalsta botu.\n\
         Lūdzu, vispirms veiciet pasūtījumu un mēģiniet vēlreiz!\n\n\
         🇷🇺 <b>Доступ запрещён</b>\n\
         У вас должен быть активный заказ в @{bot_username}, чтобы использовать этот бот поддержки.\n\
         Пожалуйста, сначала сделайте заказ и попробуйте снова!"
    )
}

fn welcome_text(bot_username: &str) -> String {
    format!(
        "🇬🇧 <b>Welcome to Support!</b>\n\
         Please describe your issue with @{bot_username}. You can attach a photo or video if needed.\n\n\
         🇱🇻 <b>Sveiki!</b>\n\
         Lūdzu, aprakstiet savu problēmu ar @{bot_username}. Varat pievienot foto vai video.\n\n\
         🇷🇺 <b>Добро пожаловать в поддержку!</b>\n\
         Опишите вашу проблему с @{bot_username}. При необходимости прикрепите фото или видео."
    )
}

/// The only user-visible failure message in the system.
const SOMETHING_WENT_WRONG: &str = "🇬🇧 <b>Oops!</b> Something went wrong. Please try again later.\n\n\
     🇱🇻 <b>Ak vai!</b> Kaut kas nogāja greizi. Lūdzu, mēģiniet vēlreiz vēlāk.\n\n\
     🇷🇺 <b>Ой!</b> Что-то пошло не так. Пожалуйста, попробуйте снова позже.";

/// Answer a start-like message: reject strangers, greet known users.
pub async fn handle_start(
    bot: Bot,
    msg: Message,
    ctx: Arc<IngressContext>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let bot_username = ctx.settings.get().bot_username;

    let has_records = match ctx.store.has_drops(user_id) {
        Ok(has) => has,
        Err(e) => {
            warn!(user_id, error = %e, "welcome lookup failed");
            bot.send_message(msg.chat.id, SOMETHING_WENT_WRONG)
                .parse_mode(ParseMode::Html)
                .await?;
            return Ok(());
        }
    };

    if !has_records {
        bot.send_message(msg.chat.id, rejection_text(&bot_username))
            .parse_mode(ParseMode::Html)
            .await?;
        info!(user_id, "welcome denied, no orders on file");
        return Ok(());
    }

    let photo = Path::new(&ctx.config.engine.data_dir).join("welcome.jpg");
    let sent = bot
        .send_photo(msg.chat.id, InputFile::file(photo))
        .caption(welcome_text(&bot_username))
        .parse_mode(ParseMode::Html)
        .await;
    if sent.is_err() {
        // Image missing or upload failed — the text still has to go out.
        bot.send_message(msg.chat.id, welcome_text(&bot_username))
            .parse_mode(ParseMode::Html)
            .await?;
    }

    info!(user_id, "welcome sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_decorated_start_match() {
        assert!(is_similar_to_start("start"));
        assert!(is_similar_to_start("  START "));
        assert!(is_similar_to_start("/start"));
        assert!(is_similar_to_start("#start"));
    }

    #[test]
    fn close_typos_match() {
        assert!(is_similar_to_start("strat"));
        assert!(is_similar_to_start("starta"));
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert!(!is_similar_to_start("hello"));
        assert!(!is_similar_to_start("i lost my drop"));
        assert!(!is_similar_to_start(""));
        assert!(!is_similar_to_start("///"));
    }
}
