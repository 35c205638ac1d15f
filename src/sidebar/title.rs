//! Title derivation for thread summaries.
//!
//! Precedence, first match wins:
//! 1. an explicit, non-default `title`, verbatim;
//! 2. the leading clause of `message`;
//! 3. the leading clause of `response`, behind the assistant prefix;
//! 4. `content`, stringified when it is not a string;
//! 5. `Chat <first characters of the thread id>`;
//! 6. the configured fallback (`New Chat`).
//!
//! Free text longer than `max_len` characters is cut to `cut_len` characters
//! and gets the ellipsis appended.

use serde_json::Value;

use super::config::TitleRules;
use super::types::ChatRecord;

/// Characters that end the leading clause of a message.
const CLAUSE_TERMINATORS: [char; 5] = ['.', '!', '?', ',', '\n'];

/// Titles the store uses as placeholders; they never win over derived text.
const DEFAULT_TITLES: [&str; 3] = ["", "new chat", "untitled"];

/// Derive the display title of a record.
#[must_use]
pub fn derive_title(record: &ChatRecord, rules: &TitleRules) -> String {
    if let Some(title) = record.title.as_deref().filter(|t| !is_default_title(t)) {
        return title.to_string();
    }

    if let Some(message) = non_blank(record.message.as_deref()) {
        return summarize(message, rules);
    }

    if let Some(response) = non_blank(record.response.as_deref()) {
        return format!("{}{}", rules.response_prefix, summarize(response, rules));
    }

    let content = record.content.as_ref().and_then(content_text);
    if let Some(text) = non_blank(content.as_deref()) {
        return truncate(text, rules);
    }

    if !record.thread_id.is_blank() {
        return format!("Chat {}", record.thread_id.short(rules.id_prefix_len));
    }

    rules.fallback.clone()
}

/// Whether a stored title is a placeholder rather than a real title.
#[must_use]
pub fn is_default_title(title: &str) -> bool {
    let normalized = title.trim().to_lowercase();
    DEFAULT_TITLES.contains(&normalized.as_str())
}

/// Cut `text` to the configured length, appending the ellipsis when it was too long.
#[must_use]
pub fn truncate(text: &str, rules: &TitleRules) -> String {
    if text.chars().count() <= rules.max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(rules.cut_len).collect();
    format!("{}{}", cut.trim_end(), rules.ellipsis)
}

/// Leading clause when it is long enough, otherwise the whole text; truncated.
fn summarize(text: &str, rules: &TitleRules) -> String {
    let clause = text
        .split(CLAUSE_TERMINATORS)
        .next()
        .map(str::trim)
        .unwrap_or_default();

    if clause.chars().count() > rules.min_clause_len {
        truncate(clause, rules)
    } else {
        truncate(text, rules)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn content_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
