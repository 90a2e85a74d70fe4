//! The operator dossier: user summary + drop history table, posted into a
//! group right after it receives a ticket. Rendering is pure; only
//! [`post`] touches the platform.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use triage_store::{DropOrder, DropRecord, Store, UserWithDrops};

/// Platform message-length cap.
const MAX_MESSAGE_LEN: usize = 4096;

const DOSSIER_STATUSES: [&str; 4] = ["paid", "lost", "redrop", "angry_redrop"];

/// Render and send the dossier. Failures degrade to an error line in the
/// group so operators see that something is missing.
pub async fn post(bot: &Bot, store: &Store, user_id: i64, group_id: i64) {
    let data = match store.user_and_drops(user_id, &DOSSIER_STATUSES, DropOrder::UpdatedAtAsc) {
        Ok(Some(data)) => data,
        Ok(None) => {
            let _ = bot
                .send_message(ChatId(group_id), "ERROR: User not found in database.")
                .await;
            return;
        }
        Err(e) => {
            error!(user_id, error = %e, "dossier query failed");
            let _ = bot
                .send_message(
                    ChatId(group_id),
                    "An error occurred while retrieving user data.",
                )
                .await;
            return;
        }
    };
    let roles = store.user_roles(user_id).unwrap_or_default();

    for part in render(&data, &roles) {
        if let Err(e) = bot
            .send_message(ChatId(group_id), part)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            error!(user_id, group_id, error = %e, "dossier part send failed");
        }
    }
}

/// Escape the Markdown-V1 specials in user-controlled fields.
pub fn escape_markdown_v1(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Render the dossier into one or more ≤4096-character parts.
pub fn render(data: &UserWithDrops, roles: &[String]) -> Vec<String> {
    let user = &data.user;
    let username = escape_markdown_v1(user.username.as_deref().unwrap_or(""));
    let first_name = escape_markdown_v1(user.first_name.as_deref().unwrap_or(""));
    let last_name = escape_markdown_v1(user.last_name.as_deref().unwrap_or(""));

    let user_info = format!(
        "👤 @{username} (`{id}`)\n\
         🪪 [{first_name}](tg://user?id={id}) {last_name}\n\
         🏷️ *Roles:* {roles}\n\
         🕒 *First interaction:* {created}\n\
         🕒 *Last interaction:* {updated}\n\n",
        id = user.user_id,
        roles = roles.join(", "),
        created = user.created_at.format("%Y-%m-%d %H:%M:%S"),
        updated = user.updated_at.format("%Y-%m-%d %H:%M:%S"),
    );

    let drops = &data.drops;
    let total = drops.len();
    let paid = drops.iter().filter(|d| d.status == "paid").count();
    let lost = drops.iter().filter(|d| d.lost).count();
    let redrops = drops.iter().filter(|d| d.status == "redrop").count();
    let angry = drops.iter().filter(|d| d.status == "angry_redrop").count();

    let mut summary_lines = vec![format!("*Summary*\n📦 Total drops: {total}\n")];
    if paid > 0 {
        summary_lines.push(format!("✔️ Paid drops: {paid}"));
    }
    if lost > 0 {
        summary_lines.push(format!("❌ Lost drops: {lost}"));
    }
    if redrops > 0 {
        summary_lines.push(format!("❤️ Normal redrops: {redrops}"));
    }
    if angry > 0 {
        summary_lines.push(format!("🤡 Angry redrops: {angry}"));
    }
    let summary = summary_lines.join("\n");

    if drops.is_empty() {
        let table = "_No successful drops found._\n\n";
        return split_parts(&user_info, table, &[], "", &summary);
    }

    let header = format!(
        "*Drop Summary*\n```perl\n\
         {} {} {} {} {} {}\n\
         {} {} {} {} {} {}\n",
        pad("ID", 6),
        pad("P", 2),
        pad("Amt", 4),
        pad("Area", 15),
        pad("Date", 10),
        pad("Status", 15),
        "-".repeat(6),
        "-".repeat(2),
        "-".repeat(4),
        "-".repeat(15),
        "-".repeat(10),
        "-".repeat(10),
    );
    let rows: Vec<String> = drops.iter().map(row_line).collect();
    split_parts(&user_info, &header, &rows, "```\n", &summary)
}

fn row_line(drop: &DropRecord) -> String {
    let area = escape_markdown_v1(drop.area_name.as_deref().unwrap_or(""));
    let city = drop
        .city_name
        .as_ref()
        .map(|c| format!("{}, ", escape_markdown_v1(c)))
        .unwrap_or_default();
    let status = match drop.status.as_str() {
        "" | "paid" => String::new(),
        "angry_redrop" => "🤡 Redrop".to_string(),
        other => title_case(other),
    };
    let lost = if drop.lost { "(Lost)" } else { "" };

    let mut line = format!(
        "{} {} {} {} {} {status}{lost}\n",
        pad(&drop.drop_id.to_string(), 5),
        pad(&drop.product_emoji, 2),
        pad(&format_amount(drop.batch_amount), 4),
        pad(&format!("{city}{area}"), 15),
        pad(&drop.updated_at.format("%Y-%m-%d").to_string(), 10),
    );
    if let Some(reason) = &drop.reason {
        line.push_str(&format!("\tReason: {reason}\n"));
    }
    line
}

/// Char-truncate then left-pad to `width` characters.
fn pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop amounts print without trailing zeros ("2.50" → "2.5", "3.00" → "3").
fn format_amount(amount: f64) -> String {
    let rounded = format!("{amount:.2}");
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The 4096 split rules: whole message first, then "user+summary" /
/// "table", then a row-level split that repeats the table header in both
/// parts. Multi-part output is prefixed `Part i/N`.
fn split_parts(
    user_info: &str,
    table_header: &str,
    rows: &[String],
    table_footer: &str,
    summary: &str,
) -> Vec<String> {
    let table = format!("{table_header}{}{table_footer}", rows.concat());
    let full = format!("{user_info}{table}{summary}");
    if char_len(&full) <= MAX_MESSAGE_LEN {
        return vec![full];
    }

    let part1 = format!("{user_info}{summary}");
    if char_len(&part1) < MAX_MESSAGE_LEN && char_len(&table) < MAX_MESSAGE_LEN {
        return vec![format!("Part 1/2\n{part1}"), format!("Part 2/2\n{table}")];
    }

    // Split the table itself, keeping the header and summary in each part.
    let tail = char_len(table_footer) + char_len(summary);
    let mut first_rows = String::new();
    let mut second_rows = String::new();
    let mut current = char_len(user_info) + char_len(table_header);
    for row in rows {
        if second_rows.is_empty() && current + char_len(row) + tail < MAX_MESSAGE_LEN {
            first_rows.push_str(row);
            current += char_len(row);
        } else {
            second_rows.push_str(row);
        }
    }

    let mut parts = Vec::new();
    if !first_rows.is_empty() {
        parts.push(format!(
            "{user_info}{table_header}{first_rows}{table_footer}{summary}"
        ));
    }
    if !second_rows.is_empty() {
        parts.push(format!("{table_header}{second_rows}{table_footer}{summary}"));
    }
    if parts.is_empty() {
        // Nothing splittable; send oversized and let the platform complain.
        return vec![full];
    }
    let n = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| format!("Part {}/{n}\n{part}", i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use triage_store::UserRecord;

    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            user_id: 555,
            username: Some("digger_42".into()),
            first_name: Some("Ann".into()),
            last_name: Some("K".into()),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 7, 8, 9, 10).unwrap(),
        }
    }

    fn drop_record(id: i64, status: &str, lost: bool) -> DropRecord {
        DropRecord {
            drop_id: id,
            status: status.into(),
            area_name: Some("Center".into()),
            batch_amount: 2.5,
            lost,
            city_name: Some("Riga".into()),
            reason: None,
            product_emoji: "🍵".into(),
            updated_at: Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn small_dossier_is_one_part() {
        let data = UserWithDrops {
            user: user(),
            drops: vec![drop_record(1, "paid", false), drop_record(2, "angry_redrop", true)],
        };
        let parts = render(&data, &["client".into()]);
        assert_eq!(parts.len(), 1);
        let text = &parts[0];
        assert!(text.contains("@digger\\_42"));
        assert!(text.contains("*First interaction:* 2025-01-02 03:04:05"));
        assert!(text.contains("🤡 Redrop(Lost)"));
        assert!(text.contains("✔️ Paid drops: 1"));
        assert!(text.contains("🤡 Angry redrops: 1"));
        // redrop count line is suppressed at zero
        assert!(!text.contains("Normal redrops"));
    }

    #[test]
    fn no_drops_renders_placeholder() {
        let data = UserWithDrops {
            user: user(),
            drops: vec![],
        };
        let parts = render(&data, &[]);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].contains("_No successful drops found._"));
        assert!(parts[0].contains("📦 Total drops: 0"));
    }

    #[test]
    fn exactly_max_len_is_single_message() {
        let summary = "s".repeat(MAX_MESSAGE_LEN - 10);
        let parts = split_parts(&"u".repeat(10), "", &[], "", &summary);
        assert_eq!(parts.len(), 1);
        assert_eq!(char_len(&parts[0]), MAX_MESSAGE_LEN);
    }

    #[test]
    fn one_char_over_splits_into_user_and_table_parts() {
        // user+summary and table each fit on their own.
        let user_info = "u".repeat(100);
        let rows: Vec<String> = (0..35).map(|_| "r".repeat(100)).collect();
        // Total comes to exactly MAX_MESSAGE_LEN + 1.
        let summary = "s".repeat(MAX_MESSAGE_LEN + 1 - 100 - 3500);
        let parts = split_parts(&user_info, "", &rows, "", &summary);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("Part 1/2\n"));
        assert!(parts[0].contains(&user_info));
        assert!(parts[1].starts_with("Part 2/2\n"));
        assert!(parts[1].contains(&rows[0]));
    }

    #[test]
    fn oversized_table_splits_by_rows_with_header_in_both() {
        let user_info = "U";
        let header = "H\n";
        let footer = "F\n";
        let summary = "S";
        let rows: Vec<String> = (0..41).map(|_| "r".repeat(100)).collect();
        let parts = split_parts(user_info, header, &rows, footer, summary);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("Part 1/2\n"));
        assert!(parts[1].starts_with("Part 2/2\n"));
        // Header, footer and summary repeat in both parts.
        for part in &parts {
            assert!(part.contains("H\n"));
            assert!(part.contains("F\n"));
            assert!(part.ends_with('S'));
            assert!(char_len(part) <= MAX_MESSAGE_LEN);
        }
        // The second part carries the overflow rows but not the user info.
        assert!(!parts[1].contains('U'));
    }

    #[test]
    fn amount_formatting_strips_trailing_zeros() {
        assert_eq!(format_amount(2.5), "2.5");
        assert_eq!(format_amount(3.0), "3");
        assert_eq!(format_amount(0.25), "0.25");
        assert_eq!(format_amount(10.10), "10.1");
    }

    #[test]
    fn markdown_escaping() {
        assert_eq!(escape_markdown_v1("a_b*c`d[e"), "a\\_b\\*c\\`d\\[e");
        assert_eq!(escape_markdown_v1("plain"), "plain");
    }
}
