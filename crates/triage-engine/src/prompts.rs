//! Classifier prompt construction and output validation.
//!
//! The model's output is never trusted: unknown categories and languages
//! collapse to `other`, and the complaint check defaults to `Complaint`.

use tracing::warn;

use triage_core::{Category, Lang};

/// The `lang:category` classification prompt.
pub fn lang_category_prompt(texts: &[&str]) -> String {
    let categories = Category::CLASSIFIABLE
        .iter()
        .map(|c| c.key())
        .collect::<Vec<_>>()
        .join("\n");
    let languages = Lang::KNOWN
        .iter()
        .map(|l| l.code())
        .collect::<Vec<_>>()
        .join(", ");
    let input = texts.join("\n");

    format!(
        "Classify the following user messages into:\n\n\
         1. One of the following **categories**:\n\
         \"\"\"{categories}\"\"\"\n\n\
         2. One of the following **languages**:\n\
         {languages}\n\n\
         If you are not more than 80% confident about either the category or the language, use 'other'.\n\n\
         User messages:\n\
         \"\"\"{input}\"\"\"\n\n\
         Respond **only** in this format (no extra explanation):\n\
         lang:category"
    )
}

/// The binary complaint-or-resolved prompt.
pub fn complaint_prompt(texts: &[&str]) -> String {
    let input = texts.join("\n");
    format!(
        "You are a message classifier.\n\n\
         Classify the following user messages as either:\n\n\
         - \"Complaint\" → if the user is reporting a problem, expressing frustration, or asking for help.\n\
         - \"Resolved\" → if the user says the issue is fixed, found the answer themselves, or is thanking you.\n\n\
         If unsure about the intent or language, default to \"Complaint\".\n\n\
         User messages:\n\
         \"\"\"{input}\"\"\"\n\n\
         Respond with only one word: Complaint or Resolved."
    )
}

/// Parse `lang:category`. `None` when the shape is wrong; the caller
/// substitutes `(other, other)`. Validated parts fall back to `Other`
/// individually — and the classifier may never produce `voice_message`,
/// which is reserved for the media shortcut.
pub fn parse_lang_category(raw: &str) -> Option<(Lang, Category)> {
    let (lang_part, category_part) = raw.trim().split_once(':')?;
    let lang = Lang::from_code(lang_part);
    let category = match Category::from_key(category_part) {
        Some(Category::VoiceMessage) | None => {
            if Category::from_key(category_part).is_none() {
                warn!(category = category_part.trim(), "unknown category from classifier");
            }
            Category::Other
        }
        Some(category) => category,
    };
    Some((lang, category))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Complaint,
    Resolved,
}

/// Anything that isn't exactly "Resolved" is a complaint.
pub fn parse_verdict(raw: &str) -> Verdict {
    if raw.trim().eq_ignore_ascii_case("resolved") {
        Verdict::Resolved
    } else {
        Verdict::Complaint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_classifiable_category() {
        let prompt = lang_category_prompt(&["hi"]);
        for cat in Category::CLASSIFIABLE {
            assert!(prompt.contains(cat.key()), "missing {}", cat.key());
        }
        assert!(!prompt.contains("voice_message"));
        assert!(prompt.ends_with("lang:category"));
    }

    #[test]
    fn parse_valid_pair() {
        let (lang, cat) = parse_lang_category("eng:cant_find_product_or_drop_or_dead_drop").unwrap();
        assert_eq!(lang, Lang::Eng);
        assert_eq!(cat, Category::CantFindDrop);
    }

    #[test]
    fn parse_trims_and_validates() {
        let (lang, cat) = parse_lang_category("  DE : refund_me  ").unwrap();
        assert_eq!(lang, Lang::Other);
        assert_eq!(cat, Category::Other);
    }

    #[test]
    fn parse_rejects_shapeless_output() {
        assert!(parse_lang_category("I think this is Latvian").is_none());
        assert!(parse_lang_category("").is_none());
    }

    #[test]
    fn classifier_cannot_pick_voice_message() {
        let (_, cat) = parse_lang_category("eng:voice_message").unwrap();
        assert_eq!(cat, Category::Other);
    }

    #[test]
    fn verdict_defaults_to_complaint() {
        assert_eq!(parse_verdict("Resolved"), Verdict::Resolved);
        assert_eq!(parse_verdict(" resolved \n"), Verdict::Resolved);
        assert_eq!(parse_verdict("Complaint"), Verdict::Complaint);
        assert_eq!(parse_verdict("maybe?"), Verdict::Complaint);
        assert_eq!(parse_verdict(""), Verdict::Complaint);
    }
}
