//! `triage-telegram` — the bot-role platform layer.
//!
//! Routes every inbound chat event into the right repository write and
//! optional cross-forward: user private messages, edits, operator replies
//! in per-user groups, and the close-ticket button. Also hosts the
//! deletion probe the engine uses before batching a ticket.

pub mod adapter;
pub mod callback;
pub mod content;
pub mod context;
pub mod ingress;
pub mod keyboards;
pub mod operator;
pub mod probe;
pub mod welcome;

pub use adapter::TelegramIngress;
pub use context::IngressContext;
