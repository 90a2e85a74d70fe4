//! Content labelling for inbound messages.

use teloxide::types::Message;

use triage_core::ContentKind;

/// Classify a message into its content label.
pub fn content_kind(msg: &Message) -> ContentKind {
    if msg.text().is_some() {
        ContentKind::Text
    } else if msg.photo().is_some() {
        ContentKind::Photo
    } else if msg.video().is_some() {
        ContentKind::Video
    } else if msg.document().is_some() {
        ContentKind::Document
    } else if msg.sticker().is_some() {
        ContentKind::Sticker
    } else if msg.audio().is_some() {
        ContentKind::Audio
    } else if msg.voice().is_some() {
        ContentKind::Voice
    } else if msg.animation().is_some() {
        ContentKind::Animation
    } else if msg.video_note().is_some() {
        ContentKind::VideoNote
    } else {
        ContentKind::Other
    }
}

/// The text stored under the ticket: the raw text for text messages, the
/// bracketed placeholder for everything else. Captions are not persisted.
pub fn content_text(msg: &Message) -> String {
    match content_kind(msg) {
        ContentKind::Text => msg.text().unwrap_or("").to_string(),
        kind => kind.placeholder().to_string(),
    }
}
