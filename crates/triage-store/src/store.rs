use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::db::init_db;
use crate::error::Result;
use crate::types::{
    BotSettings, DropOrder, DropRecord, GroupBinding, MessageWithTicket, StoredMessage, Ticket,
    TicketFilter, TicketWithMessages, UserRecord, UserWithDrops,
};

const TICKET_COLS: &str =
    "ticket_id, user_id, closed, messages_forwarded, support_issue, lang, created_at";
const MESSAGE_COLS: &str =
    "id, ticket_id, user_id, message_id, user_text, replied, is_deleted, created_at";

/// Typed repository over the support schema.
///
/// Thread-safe: wraps the SQLite connection in a `Mutex`; clones share the
/// same connection. Every operation is transactional at the statement
/// level; [`Store::append_user_message`] runs as one transaction.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Wrap an existing connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: &str) -> Result<Self> {
        Self::new(Connection::open(path)?)
    }

    // --- tickets and messages ----------------------------------------------

    /// Atomic find-or-create of the user's open ticket plus message insert.
    /// Returns the ticket id the message landed under.
    pub fn append_user_message(
        &self,
        user_id: i64,
        message_id: i64,
        text: &str,
        replied: bool,
    ) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let open: Option<i64> = tx
            .query_row(
                "SELECT ticket_id FROM support_tickets
                 WHERE user_id = ?1 AND closed = 0 LIMIT 1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        let ticket_id = match open {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO support_tickets (user_id, created_at) VALUES (?1, ?2)",
                    params![user_id, now],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO support_messages
             (ticket_id, user_id, message_id, user_text, replied, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![ticket_id, user_id, message_id, text, replied, now],
        )?;
        tx.commit()?;

        debug!(user_id, ticket_id, message_id, "message appended");
        Ok(ticket_id)
    }

    /// Open tickets matching `filter`, each with messages sorted by
    /// platform message id.
    pub fn active_tickets(&self, filter: &TicketFilter) -> Result<Vec<TicketWithMessages>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT {TICKET_COLS} FROM support_tickets WHERE closed = 0");
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(forwarded) = filter.forwarded {
            sql.push_str(" AND messages_forwarded = ?");
            args.push(Box::new(forwarded));
        }
        if let Some(user_id) = filter.user_id {
            sql.push_str(" AND user_id = ?");
            args.push(Box::new(user_id));
        }
        sql.push_str(" ORDER BY ticket_id");

        let mut stmt = conn.prepare(&sql)?;
        let tickets: Vec<Ticket> = stmt
            .query_map(
                params_from_iter(args.iter().map(|a| a.as_ref() as &dyn ToSql)),
                row_to_ticket,
            )?
            .collect::<rusqlite::Result<_>>()?;

        let mut out = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let messages = messages_for(&conn, ticket.ticket_id)?;
            out.push(TicketWithMessages { ticket, messages });
        }
        Ok(out)
    }

    /// One ticket with its messages, or `None` when it doesn't exist.
    pub fn ticket_with_messages(&self, ticket_id: i64) -> Result<Option<TicketWithMessages>> {
        let conn = self.conn.lock().unwrap();
        let ticket = conn
            .query_row(
                &format!("SELECT {TICKET_COLS} FROM support_tickets WHERE ticket_id = ?1"),
                [ticket_id],
                row_to_ticket,
            )
            .optional()?;
        match ticket {
            Some(ticket) => {
                let messages = messages_for(&conn, ticket.ticket_id)?;
                Ok(Some(TicketWithMessages { ticket, messages }))
            }
            None => Ok(None),
        }
    }

    /// Set `(support_issue, lang)` together. Only the first call per ticket
    /// takes effect; later calls return `false`.
    pub fn set_lang_and_category(&self, ticket_id: i64, category: &str, lang: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_tickets SET support_issue = ?1, lang = ?2
             WHERE ticket_id = ?3 AND support_issue IS NULL",
            params![category, lang, ticket_id],
        )?;
        Ok(n == 1)
    }

    /// Mark every message of a ticket as replied. Idempotent.
    pub fn mark_messages_replied(&self, ticket_id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_messages SET replied = 1 WHERE ticket_id = ?1",
            [ticket_id],
        )?;
        Ok(n)
    }

    pub fn mark_message_deleted(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_messages SET is_deleted = 1 WHERE id = ?1",
            [id],
        )?;
        Ok(n == 1)
    }

    pub fn close_ticket(&self, ticket_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_tickets SET closed = 1 WHERE ticket_id = ?1",
            [ticket_id],
        )?;
        debug!(ticket_id, "ticket closed");
        Ok(n == 1)
    }

    /// One-way transition; never reset back to false.
    pub fn set_messages_forwarded(&self, ticket_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_tickets SET messages_forwarded = 1 WHERE ticket_id = ?1",
            [ticket_id],
        )?;
        Ok(n == 1)
    }

    /// Look a message up by sender and platform message id, joined with
    /// its ticket (edit routing needs the forwarded flag).
    pub fn message_by_platform_id(
        &self,
        user_id: i64,
        message_id: i64,
    ) -> Result<Option<MessageWithTicket>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT m.id, m.ticket_id, m.user_id, m.message_id, m.user_text,
                    m.replied, m.is_deleted, m.created_at,
                    t.ticket_id, t.user_id, t.closed, t.messages_forwarded,
                    t.support_issue, t.lang, t.created_at
             FROM support_messages m
             JOIN support_tickets t ON t.ticket_id = m.ticket_id
             WHERE m.user_id = ?1 AND m.message_id = ?2",
            params![user_id, message_id],
            |row| {
                Ok(MessageWithTicket {
                    message: row_to_message(row)?,
                    ticket: Ticket {
                        ticket_id: row.get(8)?,
                        user_id: row.get(9)?,
                        closed: row.get::<_, i64>(10)? != 0,
                        messages_forwarded: row.get::<_, i64>(11)? != 0,
                        support_issue: row.get(12)?,
                        lang: row.get(13)?,
                        created_at: read_ts(row, 14)?,
                    },
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    /// Overwrite the stored text of an edited message. Only allowed while
    /// the message is still unreplied; returns `false` otherwise.
    pub fn update_edited_message(
        &self,
        user_id: i64,
        message_id: i64,
        new_text: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE support_messages SET user_text = ?1
             WHERE user_id = ?2 AND message_id = ?3 AND replied = 0",
            params![new_text, user_id, message_id],
        )?;
        Ok(n == 1)
    }

    /// Open tickets for one user (janitor skip check).
    pub fn open_tickets(&self, user_id: i64) -> Result<Vec<Ticket>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TICKET_COLS} FROM support_tickets WHERE user_id = ?1 AND closed = 0"
        ))?;
        let tickets = stmt
            .query_map([user_id], row_to_ticket)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(tickets)
    }

    /// Creation time of the user's most recent ticket.
    pub fn latest_ticket_date(&self, user_id: i64) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn.query_row(
            "SELECT MAX(created_at) FROM support_tickets WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(raw.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }))
    }

    /// Category of the user's second-most-recent ticket.
    pub fn previous_category_key(&self, user_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let key: Option<Option<String>> = conn
            .query_row(
                "SELECT support_issue FROM support_tickets
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, ticket_id DESC
                 LIMIT 1 OFFSET 1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key.flatten())
    }

    // --- users and roles ---------------------------------------------------

    /// Keep the user's display fields fresh; first write stamps created_at.
    pub fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (user_id, username, first_name, last_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at",
            params![user_id, username, first_name, last_name, now],
        )?;
        Ok(())
    }

    pub fn user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, username, first_name, last_name, created_at, updated_at
             FROM users WHERE user_id = ?1",
            [user_id],
            row_to_user,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn user_roles(&self, user_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT r.role_name
             FROM roles r
             JOIN user_roles ur ON r.role_id = ur.role_id
             WHERE ur.user_id = ?1",
        )?;
        let roles = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(roles)
    }

    pub fn user_has_role(&self, user_id: i64, role: &str) -> Result<bool> {
        Ok(self.user_roles(user_id)?.iter().any(|r| r == role))
    }

    /// True when the user has any business record on file (welcome gating).
    pub fn has_drops(&self, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM drops WHERE client_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// User plus their drops in the given statuses — the dossier query.
    pub fn user_and_drops(
        &self,
        user_id: i64,
        statuses: &[&str],
        order: DropOrder,
    ) -> Result<Option<UserWithDrops>> {
        let Some(user) = self.user_by_id(user_id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().unwrap();
        let placeholders = (2..statuses.len() + 2)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT d.drop_id, d.status, d.area_name, d.batch_amount, d.lost,
                    c.city, r.reason, p.emoji, d.updated_at
             FROM drops d
             JOIN products p ON p.name = d.product_name
             LEFT JOIN cities c ON d.city_id = c.city_id
             LEFT JOIN redrop_reason r ON r.drop_id = d.drop_id
             WHERE d.client_id = ?1 AND d.status IN ({placeholders})
             ORDER BY {}",
            order.sql()
        );

        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];
        for status in statuses {
            args.push(Box::new(status.to_string()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let drops = stmt
            .query_map(
                params_from_iter(args.iter().map(|a| a.as_ref() as &dyn ToSql)),
                |row| {
                    Ok(DropRecord {
                        drop_id: row.get(0)?,
                        status: row.get(1)?,
                        area_name: row.get(2)?,
                        batch_amount: row.get(3)?,
                        lost: row.get::<_, i64>(4)? != 0,
                        city_name: row.get(5)?,
                        reason: row.get(6)?,
                        product_emoji: row.get(7)?,
                        updated_at: read_ts(row, 8)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<_>>()?;

        Ok(Some(UserWithDrops { user, drops }))
    }

    // --- mutes -------------------------------------------------------------

    pub fn upsert_mute(&self, user_id: i64, until: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO support_user_muted (user_id, muted_until) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET muted_until = excluded.muted_until",
            params![user_id, until.to_rfc3339()],
        )?;
        debug!(user_id, until = %until, "user muted");
        Ok(())
    }

    /// Convenience for the spam shield.
    pub fn mute_for_hours(&self, user_id: i64, hours: i64) -> Result<()> {
        self.upsert_mute(user_id, Utc::now() + Duration::hours(hours))
    }

    /// Expired (or unreadable) mute rows are removed on read.
    pub fn is_muted(&self, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT muted_until FROM support_user_muted WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(false);
        };
        let expired = DateTime::parse_from_rfc3339(&raw)
            .map(|until| until.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            conn.execute(
                "DELETE FROM support_user_muted WHERE user_id = ?1",
                [user_id],
            )?;
            return Ok(false);
        }
        Ok(true)
    }

    // --- operator-group bindings -------------------------------------------

    pub fn upsert_group_binding(&self, user_id: i64, group_id: i64, created_by: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO support_group_ids (user_id, group_id, created_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                group_id = excluded.group_id,
                created_by = excluded.created_by",
            params![user_id, group_id, created_by],
        )?;
        Ok(())
    }

    pub fn group_binding(&self, user_id: i64) -> Result<Option<GroupBinding>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, group_id, created_by FROM support_group_ids WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(GroupBinding {
                    user_id: row.get(0)?,
                    group_id: row.get(1)?,
                    created_by: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn delete_group_binding(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM support_group_ids WHERE user_id = ?1",
            [user_id],
        )?;
        Ok(())
    }

    pub fn all_group_bindings(&self) -> Result<Vec<GroupBinding>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT user_id, group_id, created_by FROM support_group_ids")?;
        let bindings = stmt
            .query_map([], |row| {
                Ok(GroupBinding {
                    user_id: row.get(0)?,
                    group_id: row.get(1)?,
                    created_by: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(bindings)
    }

    /// Advisory capacity count for the worker pool.
    pub fn count_groups_created_by(&self, created_by: &str) -> Result<u32> {
        let conn = self.conn.lock().unwrap();
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM support_group_ids WHERE created_by = ?1",
            [created_by],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // --- settings ----------------------------------------------------------

    pub fn bot_settings(&self) -> Result<Option<BotSettings>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT bot_username, support_username FROM bot_settings WHERE id = 1",
            [],
            |row| {
                Ok(BotSettings {
                    bot_username: row.get(0)?,
                    support_username: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }
}

// --- row mappers -----------------------------------------------------------

fn read_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        ticket_id: row.get(0)?,
        user_id: row.get(1)?,
        closed: row.get::<_, i64>(2)? != 0,
        messages_forwarded: row.get::<_, i64>(3)? != 0,
        support_issue: row.get(4)?,
        lang: row.get(5)?,
        created_at: read_ts(row, 6)?,
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        user_id: row.get(2)?,
        message_id: row.get(3)?,
        user_text: row.get(4)?,
        replied: row.get::<_, i64>(5)? != 0,
        is_deleted: row.get::<_, i64>(6)? != 0,
        created_at: read_ts(row, 7)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: read_ts(row, 4)?,
        updated_at: read_ts(row, 5)?,
    })
}

fn messages_for(conn: &Connection, ticket_id: i64) -> Result<Vec<StoredMessage>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM support_messages
         WHERE ticket_id = ?1 ORDER BY message_id"
    ))?;
    let messages = stmt
        .query_map([ticket_id], row_to_message)?
        .collect::<rusqlite::Result<_>>()?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn exec(store: &Store, sql: &str, args: &[&dyn ToSql]) {
        store.conn.lock().unwrap().execute(sql, args).unwrap();
    }

    #[test]
    fn append_creates_then_reuses_open_ticket() {
        let store = store();
        let t1 = store.append_user_message(111, 1, "hi", false).unwrap();
        let t2 = store.append_user_message(111, 2, "anyone?", false).unwrap();
        assert_eq!(t1, t2);

        let open = store.open_tickets(111).unwrap();
        assert_eq!(open.len(), 1);

        let ticket = store.ticket_with_messages(t1).unwrap().unwrap();
        assert_eq!(ticket.messages.len(), 2);
        assert_eq!(ticket.messages[0].message_id, 1);
        assert_eq!(ticket.messages[1].user_text, "anyone?");
    }

    #[test]
    fn closed_ticket_is_not_reused() {
        let store = store();
        let t1 = store.append_user_message(111, 1, "hi", false).unwrap();
        store.close_ticket(t1).unwrap();
        let t2 = store.append_user_message(111, 2, "again", false).unwrap();
        assert_ne!(t1, t2);
        assert_eq!(store.open_tickets(111).unwrap().len(), 1);
    }

    #[test]
    fn newest_message_lands_in_the_unique_open_ticket() {
        let store = store();
        store.append_user_message(42, 7, "a", false).unwrap();
        let open = &store.open_tickets(42).unwrap()[0];
        let msg = store.message_by_platform_id(42, 7).unwrap().unwrap();
        assert_eq!(msg.message.ticket_id, open.ticket_id);
    }

    #[test]
    fn messages_sorted_by_platform_id() {
        let store = store();
        let t = store.append_user_message(1, 30, "third", false).unwrap();
        store.append_user_message(1, 10, "first", false).unwrap();
        store.append_user_message(1, 20, "second", false).unwrap();
        let ticket = store.ticket_with_messages(t).unwrap().unwrap();
        let ids: Vec<i64> = ticket.messages.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn lang_and_category_set_exactly_once() {
        let store = store();
        let t = store.append_user_message(1, 1, "hi", false).unwrap();
        assert!(store.set_lang_and_category(t, "ok", "eng").unwrap());
        assert!(!store.set_lang_and_category(t, "other", "ru").unwrap());

        let ticket = store.ticket_with_messages(t).unwrap().unwrap().ticket;
        assert_eq!(ticket.support_issue.as_deref(), Some("ok"));
        assert_eq!(ticket.lang.as_deref(), Some("eng"));
    }

    #[test]
    fn mark_replied_is_idempotent() {
        let store = store();
        let t = store.append_user_message(1, 1, "hi", false).unwrap();
        store.append_user_message(1, 2, "there", false).unwrap();
        assert_eq!(store.mark_messages_replied(t).unwrap(), 2);
        // Second run rewrites the same rows; nothing new becomes unread.
        store.mark_messages_replied(t).unwrap();
        let ticket = store.ticket_with_messages(t).unwrap().unwrap();
        assert!(ticket.messages.iter().all(|m| m.replied));
    }

    #[test]
    fn edit_rejected_once_replied() {
        let store = store();
        let t = store.append_user_message(9, 5, "typo", false).unwrap();
        assert!(store.update_edited_message(9, 5, "fixed").unwrap());
        store.mark_messages_replied(t).unwrap();
        assert!(!store.update_edited_message(9, 5, "too late").unwrap());

        let msg = store.message_by_platform_id(9, 5).unwrap().unwrap();
        assert_eq!(msg.message.user_text, "fixed");
    }

    #[test]
    fn active_tickets_filters() {
        let store = store();
        let t1 = store.append_user_message(1, 1, "a", false).unwrap();
        let t2 = store.append_user_message(2, 1, "b", false).unwrap();
        store.set_messages_forwarded(t2).unwrap();

        let unforwarded = store
            .active_tickets(&TicketFilter {
                forwarded: Some(false),
                user_id: None,
            })
            .unwrap();
        assert_eq!(unforwarded.len(), 1);
        assert_eq!(unforwarded[0].ticket.ticket_id, t1);

        let per_user = store
            .active_tickets(&TicketFilter {
                forwarded: None,
                user_id: Some(2),
            })
            .unwrap();
        assert_eq!(per_user.len(), 1);
        assert!(per_user[0].ticket.messages_forwarded);
    }

    #[test]
    fn mute_expires_and_row_is_removed_on_read() {
        let store = store();
        store
            .upsert_mute(5, Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(!store.is_muted(5).unwrap());
        // Row is gone now; a second read still reports unmuted.
        let count: i64 = store
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM support_user_muted", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);

        store.mute_for_hours(5, 24).unwrap();
        assert!(store.is_muted(5).unwrap());
    }

    #[test]
    fn previous_category_key_reads_second_latest() {
        let store = store();
        let t1 = store.append_user_message(7, 1, "q1", false).unwrap();
        store.set_lang_and_category(t1, "ok", "eng").unwrap();
        store.close_ticket(t1).unwrap();
        let _t2 = store.append_user_message(7, 2, "q2", false).unwrap();

        assert_eq!(
            store.previous_category_key(7).unwrap().as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn group_binding_roundtrip_and_count() {
        let store = store();
        store.upsert_group_binding(1, -100, "+371000001").unwrap();
        store.upsert_group_binding(2, -200, "+371000001").unwrap();
        store.upsert_group_binding(3, -300, "+371000002").unwrap();

        assert_eq!(store.count_groups_created_by("+371000001").unwrap(), 2);
        let binding = store.group_binding(2).unwrap().unwrap();
        assert_eq!(binding.group_id, -200);

        store.delete_group_binding(2).unwrap();
        assert!(store.group_binding(2).unwrap().is_none());
        assert_eq!(store.all_group_bindings().unwrap().len(), 2);
    }

    #[test]
    fn user_and_drops_joins_city_reason_emoji() {
        let store = store();
        store
            .upsert_user(10, Some("ann"), Some("Ann"), None)
            .unwrap();
        exec(
            &store,
            "INSERT INTO products (name, emoji) VALUES ('tea', '🍵')",
            &[],
        );
        exec(&store, "INSERT INTO cities (city) VALUES ('Riga')", &[]);
        let now = Utc::now().to_rfc3339();
        exec(
            &store,
            "INSERT INTO drops (client_id, product_name, status, area_name, batch_amount,
                                lost, city_id, created_at, updated_at)
             VALUES (10, 'tea', 'paid', 'Center', 2.5, 0, 1, ?1, ?1)",
            &[&now as &dyn ToSql],
        );
        exec(
            &store,
            "INSERT INTO drops (client_id, product_name, status, area_name, batch_amount,
                                lost, city_id, created_at, updated_at)
             VALUES (10, 'tea', 'angry_redrop', NULL, 1.0, 1, NULL, ?1, ?1)",
            &[&now as &dyn ToSql],
        );
        exec(
            &store,
            "INSERT INTO redrop_reason (drop_id, reason) VALUES (2, 'empty spot')",
            &[],
        );

        let result = store
            .user_and_drops(10, &["paid", "lost", "redrop", "angry_redrop"], DropOrder::UpdatedAtAsc)
            .unwrap()
            .unwrap();
        assert_eq!(result.drops.len(), 2);
        assert_eq!(result.drops[0].city_name.as_deref(), Some("Riga"));
        assert_eq!(result.drops[0].product_emoji, "🍵");
        assert!(result.drops[1].lost);
        assert_eq!(result.drops[1].reason.as_deref(), Some("empty spot"));

        // Status filter excludes everything else.
        let none = store
            .user_and_drops(10, &["ready"], DropOrder::UpdatedAtAsc)
            .unwrap()
            .unwrap();
        assert!(none.drops.is_empty());
    }

    #[test]
    fn roles_and_settings() {
        let store = store();
        exec(&store, "INSERT INTO roles (role_name) VALUES ('admin')", &[]);
        exec(
            &store,
            "INSERT INTO user_roles (user_id, role_id) VALUES (1, 1)",
            &[],
        );
        assert!(store.user_has_role(1, "admin").unwrap());
        assert!(!store.user_has_role(2, "admin").unwrap());

        assert!(store.bot_settings().unwrap().is_none());
        exec(
            &store,
            "INSERT INTO bot_settings (id, bot_username, support_username)
             VALUES (1, 'shop_bot', 'ops_handle')",
            &[],
        );
        let settings = store.bot_settings().unwrap().unwrap();
        assert_eq!(settings.support_username, "ops_handle");
    }

    #[test]
    fn latest_ticket_date_none_then_some() {
        let store = store();
        assert!(store.latest_ticket_date(1).unwrap().is_none());
        store.append_user_message(1, 1, "hi", false).unwrap();
        let latest = store.latest_ticket_date(1).unwrap().unwrap();
        assert!(Utc::now().signed_duration_since(latest).num_seconds() < 5);
    }
}
