//! Text helpers for logging previews, URL extraction, and chunking.

/// Truncates a string to at most `max` characters for log previews,
/// appending an ellipsis when anything was cut. Char-boundary safe.
#[must_use]
pub fn truncate_preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

/// Extracts http/https URLs from free text, preserving first-seen order and
/// dropping duplicates. Trailing punctuation is trimmed.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for token in text.split_whitespace() {
        if token.starts_with("http://") || token.starts_with("https://") {
            let trimmed = token.trim_end_matches([',', '.', ';', ')', ']', '"', '\'']);
            if !trimmed.is_empty() && !urls.iter().any(|u| u == trimmed) {
                urls.push(trimmed.to_string());
            }
        }
    }
    urls
}

/// Splits text into chunks of at most `size` characters, on char boundaries.
/// The concatenation of the chunks is exactly the input.
#[must_use]
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if size == 0 || text.is_empty() {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
