//! `triage-store` — the repository over SQLite.
//!
//! Every other subsystem talks to the persistent state through [`Store`].
//! The schema is initialised idempotently on open; timestamps are RFC3339
//! TEXT in UTC.

pub mod db;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use settings::SettingsCache;
pub use store::Store;
pub use types::{
    BotSettings, DropOrder, DropRecord, GroupBinding, MessageWithTicket, StoredMessage, Ticket,
    TicketFilter, TicketWithMessages, UserRecord, UserWithDrops,
};
