//! Operator replies in per-user groups, relayed back to the user.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{info, warn};

use crate::content;
use crate::context::IngressContext;

const NOT_SENT_NOTICE: &str = "‼️MESSAGE NOT SENT‼️\n\n\
     ℹ️ You can't chat with the client until this bot sends another ticket from him!\n\
     ℹ️ Write him a private message from your account if you need to talk to him.";

/// Handle an operator message inside a per-user group.
///
/// The user is identified by the group's description field, set to the
/// user id at creation time. Without an open ticket the reply is rejected
/// with a visible notice; otherwise the content is relayed by type.
pub async fn handle_group_message(
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

    let is_operator = ctx
        .store
        .user_has_role(from.id.0 as i64, "admin")
        .unwrap_or(false);
    if !is_operator {
        return Ok(());
    }

    let chat = bot.get_chat(msg.chat.id).await?;
    let Some(user_id) = chat
        .description()
        .and_then(|d| d.trim().parse::<i64>().ok())
    else {
        warn!(chat_id = msg.chat.id.0, "group has no user id in its description");
        return Ok(());
    };

    let open = ctx.store.open_tickets(user_id).unwrap_or_default();
    if open.is_empty() {
        bot.send_message(msg.chat.id, NOT_SENT_NOTICE).await?;
        return Ok(());
    }

    info!(
        user_id,
        operator = from.id.0,
        content = %content::content_text(&msg),
        "operator reply relayed"
    );
    relay(&bot, user_id, &msg).await
}

/// Copy the operator's content to the user, keeping captions.
async fn relay(bot: &Bot, user_id: i64, msg: &Message) -> ResponseResult<()> {
    let to = ChatId(user_id);
    let caption = msg.caption().map(str::to_owned);

    if let Some(text) = msg.text() {
        bot.send_message(to, text).await?;
    } else if let Some(photo) = msg.photo().and_then(|p| p.last()) {
        let req = bot.send_photo(to, InputFile::file_id(photo.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(video) = msg.video() {
        let req = bot.send_video(to, InputFile::file_id(video.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(document) = msg.document() {
        let req = bot.send_document(to, InputFile::file_id(document.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(sticker) = msg.sticker() {
        bot.send_sticker(to, InputFile::file_id(sticker.file.id.clone()))
            .await?;
    } else if let Some(audio) = msg.audio() {
        let req = bot.send_audio(to, InputFile::file_id(audio.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(voice) = msg.voice() {
        let req = bot.send_voice(to, InputFile::file_id(voice.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(animation) = msg.animation() {
        let req = bot.send_animation(to, InputFile::file_id(animation.file.id.clone()));
        match caption {
            Some(c) => req.caption(c).await?,
            None => req.await?,
        };
    } else if let Some(note) = msg.video_note() {
        bot.send_video_note(to, InputFile::file_id(note.file.id.clone()))
            .await?;
    } else {
        warn!(user_id, "unsupported operator content type, nothing relayed");
    }
    Ok(())
}
