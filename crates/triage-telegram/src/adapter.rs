//! Dispatcher wiring for the ingress middleware.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event
//! loop until the process exits.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::callback;
use crate::context::IngressContext;
use crate::ingress;
use crate::operator;

/// The bot-role event loop: private messages, edits, operator replies and
/// callback buttons, each routed to its handler with the shared context.
pub struct TelegramIngress {
    bot: Bot,
    ctx: Arc<IngressContext>,
}

impl TelegramIngress {
    pub fn new(bot: Bot, ctx: Arc<IngressContext>) -> Self {
        Self { bot, ctx }
    }

    /// Connect to the platform and drive the long-polling loop.
    ///
    /// Never returns — runs for the lifetime of the process.
    pub async fn run(self) {
        info!("ingress: starting long-polling dispatcher");

        let handler = dptree::entry()
            .branch(Update::filter_callback_query().endpoint(callback::handle_callback))
            .branch(Update::filter_edited_message().endpoint(ingress::handle_edited_message))
            .branch(Update::filter_message().endpoint(route_message));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.ctx])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;
    }
}

async fn route_message(bot: Bot, msg: Message, ctx: Arc<IngressContext>) -> ResponseResult<()> {
    if msg.chat.is_private() {
        ingress::handle_private_message(bot, msg, ctx).await
    } else if msg.chat.is_group() {
        operator::handle_group_message(bot, msg, ctx).await
    } else {
        Ok(())
    }
}
