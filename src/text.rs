use chrono::NaiveDate;

use crate::i18n::Language;

const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read `text`, counting space-separated segments.
pub fn reading_time(text: &str) -> u32 {
    let words = text.split(' ').count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cuts `text` to `max_len` characters and appends `...` when it was longer.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Formats a `YYYY-MM-DD` (or RFC 3339) date for display. Input that does
/// not start with a date is returned unchanged.
pub fn format_date(date: &str, language: Language) -> String {
    let Some(day) = date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    else {
        return date.to_string();
    };
    match language {
        Language::En => day.format("%B %-d, %Y").to_string(),
        Language::Vi => day.format("%d/%m/%Y").to_string(),
    }
}
