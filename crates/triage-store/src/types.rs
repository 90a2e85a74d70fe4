use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One support episode for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: i64,
    pub user_id: i64,
    pub closed: bool,
    pub messages_forwarded: bool,
    /// Category key, set together with `lang` exactly once.
    pub support_issue: Option<String>,
    pub lang: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One user utterance under a ticket. `user_text` is the raw text or a
/// bracketed placeholder like `(photo)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    /// Platform-assigned message id.
    pub message_id: i64,
    pub user_text: String,
    pub replied: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// A ticket with its messages, sorted by platform message id.
#[derive(Debug, Clone)]
pub struct TicketWithMessages {
    pub ticket: Ticket,
    pub messages: Vec<StoredMessage>,
}

/// A single message joined with its owning ticket (edit handling).
#[derive(Debug, Clone)]
pub struct MessageWithTicket {
    pub message: StoredMessage,
    pub ticket: Ticket,
}

/// Maps a user to their persistent operator group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBinding {
    pub user_id: i64,
    pub group_id: i64,
    /// Worker identity that created the group; the janitor must delete
    /// through the same identity.
    pub created_by: String,
}

/// Externally editable operational strings.
#[derive(Debug, Clone, Default)]
pub struct BotSettings {
    pub bot_username: String,
    pub support_username: String,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// "{first} {last}" with the last name omitted when absent — the
    /// operator-group title format.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{first} {last}"),
            _ => first.to_string(),
        }
    }
}

/// One business record row for the dossier table.
#[derive(Debug, Clone)]
pub struct DropRecord {
    pub drop_id: i64,
    pub status: String,
    pub area_name: Option<String>,
    pub batch_amount: f64,
    pub lost: bool,
    pub city_name: Option<String>,
    pub reason: Option<String>,
    pub product_emoji: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserWithDrops {
    pub user: UserRecord,
    pub drops: Vec<DropRecord>,
}

/// Filters for [`crate::Store::active_tickets`]. `None` means "don't
/// filter on this field"; `closed = false` is always applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFilter {
    pub forwarded: Option<bool>,
    pub user_id: Option<i64>,
}

/// Sort order for the dossier drop query. Typed so no caller-supplied SQL
/// fragment ever reaches the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOrder {
    UpdatedAtAsc,
    UpdatedAtDesc,
}

impl DropOrder {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            DropOrder::UpdatedAtAsc => "d.updated_at ASC",
            DropOrder::UpdatedAtDesc => "d.updated_at DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_with_and_without_last() {
        let mut user = UserRecord {
            user_id: 1,
            username: None,
            first_name: Some("Ann".into()),
            last_name: Some("Kalnina".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "Ann Kalnina");
        user.last_name = None;
        assert_eq!(user.display_name(), "Ann");
        user.last_name = Some(String::new());
        assert_eq!(user.display_name(), "Ann");
    }
}
