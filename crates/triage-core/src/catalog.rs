//! The issue-category and language catalog.
//!
//! One declarative table, validated at startup by construction: categories
//! are an enum, their routing is a typed [`Action`], and the classifier's
//! free-text output is funnelled through [`Category::from_key`] /
//! [`Lang::from_code`] which fall back to `Other` on anything unknown.

use serde::{Deserialize, Serialize};

/// Languages the classifier is allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Lv,
    Ee,
    Ru,
    Eng,
    Other,
}

impl Lang {
    pub const KNOWN: [Lang; 4] = [Lang::Lv, Lang::Eng, Lang::Ru, Lang::Ee];

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Lv => "lv",
            Lang::Ee => "ee",
            Lang::Ru => "ru",
            Lang::Eng => "eng",
            Lang::Other => "other",
        }
    }

    /// Parse a classifier-reported code. Unknown codes become `Other`.
    pub fn from_code(code: &str) -> Lang {
        match code.trim().to_lowercase().as_str() {
            "lv" => Lang::Lv,
            "ee" => Lang::Ee,
            "ru" => Lang::Ru,
            "eng" => Lang::Eng,
            _ => Lang::Other,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// What the engine does with a categorized ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit a scripted reply; the template usually closes the ticket itself.
    Template(Template),
    /// Hand the ticket to a human via the escalation orchestrator.
    Escalate,
}

/// The scripted reply families. Text lives in the engine's reply tables;
/// this is only the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    GatherDropInfo,
    PaymentHelp,
    RestockInfo,
    ProductAvailability,
    ArrivalTime,
    Thanks,
    VoiceMessage,
}

/// Support-issue categories.
///
/// `VoiceMessage` is never returned by the classifier; the engine assigns
/// it directly on the voice/audio media shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    CantFindDrop,
    DontKnowHowToPay,
    RestockRequest,
    ProductAvailability,
    ProductArrivalTime,
    UserSaysThanks,
    IssueResolvedByUser,
    Ok,
    WrongDropInfo,
    PaymentSentNoDrop,
    LessProductReceived,
    PackagingComplaint,
    BotBanned,
    OpinionOrInfoQuestion,
    ClosestDropToLocation,
    Other,
    VoiceMessage,
}

impl Category {
    /// Everything the classifier may pick from, in prompt order.
    pub const CLASSIFIABLE: [Category; 16] = [
        Category::CantFindDrop,
        Category::DontKnowHowToPay,
        Category::RestockRequest,
        Category::ProductAvailability,
        Category::ProductArrivalTime,
        Category::UserSaysThanks,
        Category::IssueResolvedByUser,
        Category::Ok,
        Category::WrongDropInfo,
        Category::PaymentSentNoDrop,
        Category::LessProductReceived,
        Category::PackagingComplaint,
        Category::BotBanned,
        Category::OpinionOrInfoQuestion,
        Category::ClosestDropToLocation,
        Category::Other,
    ];

    /// The stable key stored in `support_tickets.support_issue` and shown
    /// to the classifier.
    pub fn key(&self) -> &'static str {
        match self {
            Category::CantFindDrop => "cant_find_product_or_drop_or_dead_drop",
            Category::DontKnowHowToPay => "dont_know_how_to_pay",
            Category::RestockRequest => "restock_request_for_product_or_location",
            Category::ProductAvailability => "is_product_still_available",
            Category::ProductArrivalTime => "what_is_usual_product_arrival_time",
            Category::UserSaysThanks => "user_says_thanks",
            Category::IssueResolvedByUser => "issue_resolved_by_user",
            Category::Ok => "ok",
            Category::WrongDropInfo => "wrong_drop_info",
            Category::PaymentSentNoDrop => {
                "payment_sent_but_no_drop_or_product_or_location_or_coordinates"
            }
            Category::LessProductReceived => "less_product_received_than_expected",
            Category::PackagingComplaint => "kladmen_or_packaging_complaint",
            Category::BotBanned => "bot_banned_or_deleted_or_inaccessible",
            Category::OpinionOrInfoQuestion => "opinion_or_info_question",
            Category::ClosestDropToLocation => "can_you_get_me_the_closest_drop_to_x_location",
            Category::Other => "other",
            Category::VoiceMessage => "voice_message",
        }
    }

    /// Parse a stored or classifier-reported key. `None` for unknown keys —
    /// callers decide whether to substitute [`Category::Other`].
    pub fn from_key(key: &str) -> Option<Category> {
        let key = key.trim();
        [
            Category::VoiceMessage,
            Category::CantFindDrop,
            Category::DontKnowHowToPay,
            Category::RestockRequest,
            Category::ProductAvailability,
            Category::ProductArrivalTime,
            Category::UserSaysThanks,
            Category::IssueResolvedByUser,
            Category::Ok,
            Category::WrongDropInfo,
            Category::PaymentSentNoDrop,
            Category::LessProductReceived,
            Category::PackagingComplaint,
            Category::BotBanned,
            Category::OpinionOrInfoQuestion,
            Category::ClosestDropToLocation,
            Category::Other,
        ]
        .into_iter()
        .find(|c| c.key() == key)
    }

    /// The dispatch table (one place, typed). Escalation is a sentinel the
    /// engine resolves itself; handlers never escalate on their own.
    pub fn action(&self) -> Action {
        match self {
            Category::CantFindDrop => Action::Template(Template::GatherDropInfo),
            Category::DontKnowHowToPay => Action::Template(Template::PaymentHelp),
            Category::RestockRequest => Action::Template(Template::RestockInfo),
            Category::ProductAvailability => Action::Template(Template::ProductAvailability),
            Category::ProductArrivalTime => Action::Template(Template::ArrivalTime),
            Category::UserSaysThanks | Category::IssueResolvedByUser | Category::Ok => {
                Action::Template(Template::Thanks)
            }
            Category::VoiceMessage => Action::Template(Template::VoiceMessage),
            Category::WrongDropInfo
            | Category::PaymentSentNoDrop
            | Category::LessProductReceived
            | Category::PackagingComplaint
            | Category::BotBanned
            | Category::OpinionOrInfoQuestion
            | Category::ClosestDropToLocation
            | Category::Other => Action::Escalate,
        }
    }

    /// True for categories answered purely from templates. These are the
    /// only ones subject to the anti-loop suppression rule: repeating the
    /// same template-only question closes the ticket silently.
    pub fn is_template_only(&self) -> bool {
        !matches!(
            self,
            Category::CantFindDrop
                | Category::WrongDropInfo
                | Category::PaymentSentNoDrop
                | Category::LessProductReceived
                | Category::PackagingComplaint
                | Category::BotBanned
                | Category::OpinionOrInfoQuestion
                | Category::ClosestDropToLocation
                | Category::Other
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Content label for one inbound message. Non-text messages are stored as
/// a bracketed placeholder so the ticket log stays plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Photo,
    Video,
    Voice,
    Audio,
    Sticker,
    Animation,
    Document,
    VideoNote,
    Other,
}

impl ContentKind {
    pub fn placeholder(&self) -> &'static str {
        match self {
            ContentKind::Text => "",
            ContentKind::Photo => "(photo)",
            ContentKind::Video => "(video)",
            ContentKind::Voice => "(voice)",
            ContentKind::Audio => "(audio)",
            ContentKind::Sticker => "(sticker)",
            ContentKind::Animation => "(animation)",
            ContentKind::Document => "(document)",
            ContentKind::VideoNote => "(video_note)",
            ContentKind::Other => "(other)",
        }
    }
}

/// Stored-text checks used by the engine's media-only shortcuts.
pub fn is_visual_placeholder(text: &str) -> bool {
    matches!(text, "(photo)" | "(video)" | "(video_note)")
}

pub fn is_audio_placeholder(text: &str) -> bool {
    matches!(text, "(voice)" | "(audio)")
}

pub fn is_silent_placeholder(text: &str) -> bool {
    matches!(text, "(sticker)" | "(animation)" | "(document)" | "(other)")
}

/// True when `text` is non-empty and contains only emoji (plus joiners,
/// variation selectors and whitespace). Used to close emoji-only tickets
/// without a reply.
pub fn is_emoji_only(text: &str) -> bool {
    let mut seen_emoji = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            continue;
        }
        let cp = ch as u32;
        let is_emoji = matches!(cp,
            0x1F300..=0x1FAFF   // pictographs, transport, supplemental
            | 0x1F000..=0x1F2FF // mahjong, playing cards, regional indicators
            | 0x2600..=0x27BF   // misc symbols + dingbats
            | 0x2B00..=0x2BFF   // arrows, stars
            | 0xFE0E..=0xFE0F   // variation selectors
            | 0x200D            // zero-width joiner
        );
        if !is_emoji {
            return false;
        }
        if cp != 0x200D && !(0xFE0E..=0xFE0F).contains(&cp) {
            seen_emoji = true;
        }
    }
    seen_emoji
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_key_roundtrip() {
        for cat in Category::CLASSIFIABLE {
            assert_eq!(Category::from_key(cat.key()), Some(cat));
        }
        assert_eq!(
            Category::from_key("voice_message"),
            Some(Category::VoiceMessage)
        );
    }

    #[test]
    fn unknown_key_is_none() {
        assert_eq!(Category::from_key("refund_please"), None);
        assert_eq!(Category::from_key(""), None);
    }

    #[test]
    fn lang_validation_falls_back_to_other() {
        assert_eq!(Lang::from_code("lv"), Lang::Lv);
        assert_eq!(Lang::from_code(" ENG "), Lang::Eng);
        assert_eq!(Lang::from_code("de"), Lang::Other);
    }

    #[test]
    fn escalation_categories_are_not_template_only() {
        assert!(!Category::Other.is_template_only());
        assert!(!Category::CantFindDrop.is_template_only());
        assert!(!Category::WrongDropInfo.is_template_only());
        assert!(Category::DontKnowHowToPay.is_template_only());
        assert!(Category::UserSaysThanks.is_template_only());
        assert!(Category::VoiceMessage.is_template_only());
    }

    #[test]
    fn thanks_family_shares_one_template() {
        for cat in [
            Category::UserSaysThanks,
            Category::IssueResolvedByUser,
            Category::Ok,
        ] {
            assert_eq!(cat.action(), Action::Template(Template::Thanks));
        }
    }

    #[test]
    fn emoji_only_detection() {
        assert!(is_emoji_only("👍"));
        assert!(is_emoji_only("🙏 🙏🙏"));
        assert!(is_emoji_only("👨‍👩‍👧"));
        assert!(!is_emoji_only("thanks 👍"));
        assert!(!is_emoji_only("ok"));
        assert!(!is_emoji_only(""));
        assert!(!is_emoji_only("   "));
    }

    #[test]
    fn placeholder_families() {
        assert!(is_visual_placeholder("(photo)"));
        assert!(is_visual_placeholder("(video_note)"));
        assert!(!is_visual_placeholder("(voice)"));
        assert!(is_audio_placeholder("(audio)"));
        assert!(is_silent_placeholder("(sticker)"));
        assert!(!is_silent_placeholder("hello"));
    }
}
