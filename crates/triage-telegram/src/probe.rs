//! Deletion probe.
//!
//! The Bot API has no "does message X still exist" call, so the engine
//! copies the message to a known-invalid chat and reads the answer out of
//! the error text: a message-lookup failure means the message is gone; a
//! chat-lookup failure means the probe got past the message and it still
//! exists.

use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Deleted,
    Present,
    /// Unrecognised error — treated as present and logged.
    Unknown,
}

pub fn classify_probe_error(error_text: &str) -> ProbeVerdict {
    let text = error_text.to_lowercase();
    if text.contains("message to copy not found")
        || text.contains("message_id_invalid")
        || text.contains("message identifier is not valid")
    {
        ProbeVerdict::Deleted
    } else if text.contains("chat not found") {
        ProbeVerdict::Present
    } else {
        ProbeVerdict::Unknown
    }
}

/// Probe whether the user has deleted `message_id` in their private chat.
pub async fn is_message_deleted(
    bot: &Bot,
    probe_chat_id: i64,
    user_chat_id: i64,
    message_id: i64,
) -> bool {
    let result = bot
        .copy_message(
            ChatId(probe_chat_id),
            ChatId(user_chat_id),
            MessageId(message_id as i32),
        )
        .await;

    match result {
        // The copy landing anywhere means the message exists.
        Ok(_) => false,
        Err(e) => match classify_probe_error(&e.to_string()) {
            ProbeVerdict::Deleted => true,
            ProbeVerdict::Present => false,
            ProbeVerdict::Unknown => {
                error!(user_chat_id, message_id, error = %e, "unexpected probe error");
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lookup_failures_mean_deleted() {
        for text in [
            "Bad Request: message to copy not found",
            "MESSAGE_ID_INVALID",
            "Bad Request: message identifier is not valid",
        ] {
            assert_eq!(classify_probe_error(text), ProbeVerdict::Deleted);
        }
    }

    #[test]
    fn chat_lookup_failure_means_present() {
        assert_eq!(
            classify_probe_error("Bad Request: chat not found"),
            ProbeVerdict::Present
        );
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(classify_probe_error("Too Many Requests"), ProbeVerdict::Unknown);
        assert_eq!(classify_probe_error(""), ProbeVerdict::Unknown);
    }
}
