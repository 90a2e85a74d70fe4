use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// The operator-facing close button posted under every ticket header.
pub fn close_ticket(ticket_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        "📝 Close Ticket 📝",
        format!("close_ticket:{ticket_id}"),
    )]])
}

/// Disabled state the button is swapped to after closing.
pub fn ticket_closed() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback("✅ CLOSED ✅", "noop")]])
}
