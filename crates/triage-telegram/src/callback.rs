//! The operator control surface: the `close_ticket:<id>` button.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use crate::context::IngressContext;
use crate::keyboards;

const TICKET_CLOSED_NOTICE: &str = "✅ TICKET CLOSED ✅ \n\n\
     ℹ️ You can't chat with the client until this bot sends another ticket from him!\n\
     ℹ️ Write him a private message from your account if you need to talk to him.";

/// Close a ticket from the group button and disable the button.
pub async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    ctx: Arc<IngressContext>,
) -> ResponseResult<()> {
    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(raw_id) = data.strip_prefix("close_ticket:") else {
        // "noop" from an already-closed button, or unknown data.
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };
    let Ok(ticket_id) = raw_id.parse::<i64>() else {
        warn!(data, "malformed close_ticket callback");
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };

    match ctx.store.close_ticket(ticket_id) {
        Ok(true) => info!(ticket_id, "ticket closed by operator"),
        Ok(false) => warn!(ticket_id, "close button for unknown ticket"),
        Err(e) => warn!(ticket_id, error = %e, "operator close failed"),
    }

    if let Some(message) = query.message.as_ref() {
        let chat_id = message.chat().id;
        if let Err(e) = bot
            .edit_message_reply_markup(chat_id, message.id())
            .reply_markup(keyboards::ticket_closed())
            .await
        {
            warn!(ticket_id, error = %e, "button edit failed");
        }
        bot.send_message(chat_id, TICKET_CLOSED_NOTICE).await?;
    }

    bot.answer_callback_query(&query.id).await?;
    Ok(())
}
