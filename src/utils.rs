use chrono::{DateTime, NaiveDateTime, Utc};

/// Feed titles arrive with stray markup and entities; flatten them to one plain line.
pub fn clean_text(text: &str) -> String {
    let no_html = text
        .replace("<br>", " ")
        .replace("<br/>", " ")
        .replace("&quot;", "\"")
        .replace("&#8217;", "'")
        .replace("&#8216;", "'")
        .replace("&#8220;", "\"")
        .replace("&#8221;", "\"")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    no_html
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the date formats the feed gateways hand back.
///
/// rss2json emits `YYYY-MM-DD HH:MM:SS` in UTC; raw feeds use RFC 2822 or
/// RFC 3339. Anything else yields `None`, which callers order last.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars { return s.to_string(); }
    s.chars().take(max_chars).collect::<String>() + "..."
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Splits a long message on line boundaries so every chunk fits in `max_len` bytes.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = start + max_len;
        if end >= text.len() {
            chunks.push(&text[start..]);
            break;
        }
        while !text.is_char_boundary(end) { end -= 1; }
        if end == start {
            // Budget narrower than one character: emit that character alone.
            end = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let search_range = &text[start..end];
        if let Some(last_newline) = search_range.rfind('\n') {
            let split_idx = start + last_newline + 1;
            if split_idx > start { end = split_idx; }
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rss2json_dates_as_utc() {
        let parsed = parse_timestamp("2024-03-05 14:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
    }

    #[test]
    fn parses_rfc2822_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("Tue, 05 Mar 2024 14:00:00 +0200"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T12:00:00Z"), Some(expected));
    }

    #[test]
    fn garbage_dates_are_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday-ish"), None);
    }

    #[test]
    fn clean_text_flattens_entities_and_whitespace() {
        let raw = "  Rust&#8217;s  new\n release &amp; friends<br/>today ";
        assert_eq!(clean_text(raw), "Rust's new release & friends today");
    }

    #[test]
    fn split_narrower_than_a_char_yields_single_chars() {
        assert_eq!(split_message("سلام", 1), vec!["س", "ل", "ا", "م"]);
        assert_eq!(split_message("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn split_respects_char_boundaries_and_newlines() {
        let text = "سطر أول\nسطر ثاني\nسطر ثالث";
        let chunks = split_message(text, 20);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 20));
    }
}
