use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{error, info, warn};

use triage_classifier::Classifier;
use triage_core::TriageConfig;
use triage_store::{SettingsCache, Store, TicketFilter, TicketWithMessages};

use crate::categorize;
use crate::error::Result;
use crate::escalate::Escalator;
use crate::reengage;

/// Everything a per-ticket task needs, shared behind one `Arc`.
pub struct EngineCtx {
    pub store: Store,
    pub bot: Bot,
    pub classifier: Classifier,
    pub escalator: Escalator,
    pub settings: Arc<SettingsCache>,
    pub config: TriageConfig,
}

/// The poller: wakes every few seconds, closes what has gone idle and
/// spawns one detached task per ticket that is ready to be handled.
pub struct TicketEngine {
    ctx: Arc<EngineCtx>,
}

impl TicketEngine {
    pub fn new(ctx: Arc<EngineCtx>) -> Self {
        Self { ctx }
    }

    /// Main event loop. Polls until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("ticket engine started");
        let mut interval = tokio::time::interval(Duration::from_secs(
            self.ctx.config.engine.poll_interval_secs,
        ));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("engine tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("ticket engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One pass over every open, unforwarded ticket.
    async fn tick(&self) -> Result<()> {
        let tickets = self.ctx.store.active_tickets(&TicketFilter {
            forwarded: Some(false),
            user_id: None,
        })?;
        let now = Utc::now();
        let engine = &self.ctx.config.engine;

        for tw in tickets {
            let ticket_id = tw.ticket.ticket_id;
            match decide(&tw, now, engine.debounce_secs, engine.idle_close_days) {
                Decision::Skip => {}
                Decision::CloseIdle => match self.ctx.store.close_ticket(ticket_id) {
                    Ok(_) => info!(ticket_id, "idle ticket closed"),
                    Err(e) => warn!(ticket_id, error = %e, "idle close failed"),
                },
                Decision::Handle => {
                    // Mark the whole batch replied before spawning: this is
                    // the at-most-one-handler-per-ticket guarantee. A
                    // message arriving after this write is unread again and
                    // gets its own pass on a later tick.
                    if let Err(e) = self.ctx.store.mark_messages_replied(ticket_id) {
                        warn!(ticket_id, error = %e, "mark-replied failed, skipping ticket");
                        continue;
                    }
                    let ctx = Arc::clone(&self.ctx);
                    if tw.ticket.support_issue.is_none() {
                        tokio::spawn(categorize::categorize_ticket(ctx, tw));
                    } else {
                        tokio::spawn(reengage::reengage_ticket(ctx, tw));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Skip,
    CloseIdle,
    Handle,
}

/// Debounce / idle-closure decision for one ticket.
///
/// The newest message rules: replied and older than the idle window means
/// the conversation died after our reply; unread and older than the
/// debounce window means the user has finished their typing burst.
pub(crate) fn decide(
    tw: &TicketWithMessages,
    now: DateTime<Utc>,
    debounce_secs: i64,
    idle_close_days: i64,
) -> Decision {
    let Some(last) = tw.messages.last() else {
        return Decision::Skip;
    };
    let age = now.signed_duration_since(last.created_at);
    if last.replied {
        if age > chrono::Duration::days(idle_close_days) {
            Decision::CloseIdle
        } else {
            Decision::Skip
        }
    } else if age >= chrono::Duration::seconds(debounce_secs) {
        Decision::Handle
    } else {
        Decision::Skip
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use triage_store::{StoredMessage, Ticket};

    use super::*;

    fn ticket_with(messages: Vec<StoredMessage>) -> TicketWithMessages {
        TicketWithMessages {
            ticket: Ticket {
                ticket_id: 1,
                user_id: 111,
                closed: false,
                messages_forwarded: false,
                support_issue: None,
                lang: None,
                created_at: Utc::now(),
            },
            messages,
        }
    }

    fn message(replied: bool, age_secs: i64, now: DateTime<Utc>) -> StoredMessage {
        StoredMessage {
            id: 1,
            ticket_id: 1,
            user_id: 111,
            message_id: 1,
            user_text: "hi".into(),
            replied,
            is_deleted: false,
            created_at: now - ChronoDuration::seconds(age_secs),
        }
    }

    #[test]
    fn fresh_unread_message_is_debounced() {
        let now = Utc::now();
        let tw = ticket_with(vec![message(false, 19, now)]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Skip);
    }

    #[test]
    fn unread_message_at_debounce_boundary_is_handled() {
        let now = Utc::now();
        let tw = ticket_with(vec![message(false, 20, now)]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Handle);
        let tw = ticket_with(vec![message(false, 25, now)]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Handle);
    }

    #[test]
    fn replied_ticket_closes_only_after_idle_window() {
        let now = Utc::now();
        let two_days = 2 * 24 * 3600;
        let tw = ticket_with(vec![message(true, two_days - 1, now)]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Skip);
        let tw = ticket_with(vec![message(true, two_days + 1, now)]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::CloseIdle);
    }

    #[test]
    fn newest_message_wins_over_older_unread() {
        // Older unread messages don't matter once the newest is replied.
        let now = Utc::now();
        let mut old = message(false, 3600, now);
        old.message_id = 1;
        let mut new = message(true, 30, now);
        new.message_id = 2;
        let tw = ticket_with(vec![old, new]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Skip);
    }

    #[test]
    fn empty_ticket_is_skipped() {
        let now = Utc::now();
        let tw = ticket_with(vec![]);
        assert_eq!(decide(&tw, now, 20, 2), Decision::Skip);
    }
}
