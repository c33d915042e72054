//! Best-effort recovery of structured output from model text.
//!
//! Models asked for JSON routinely wrap it in prose or code fences, leave a
//! brace unclosed, or emit stray control characters. `parse_loose` runs a
//! sanitization ladder (direct parse, fence stripping, control-character
//! removal, largest-balanced-substring extraction, closer balancing) and
//! returns `None` only when every stage fails. It never panics; callers fall
//! back to treating the response as plain text.

use serde_json::Value;

/// Attempts to parse `input` as JSON, repairing common model mistakes.
#[must_use]
pub fn parse_loose(input: &str) -> Option<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str::<Value>(unfenced.trim()) {
        return Some(value);
    }

    let cleaned = strip_control_chars(&unfenced);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim()) {
        return Some(value);
    }

    // Balancing first: for truncated output it repairs the whole value,
    // where substring extraction would only recover an inner fragment.
    if let Some(balanced) = balance_closers(&cleaned)
        && let Ok(value) = serde_json::from_str::<Value>(&balanced)
    {
        return Some(value);
    }

    largest_json_candidate(&cleaned)
        .and_then(|candidate| serde_json::from_str::<Value>(&candidate).ok())
}

/// Removes a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the language tag line, if any.
        let body = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        let body = body.strip_suffix("```").unwrap_or(body);
        return body.trim().to_string();
    }
    trimmed.to_string()
}

/// Drops control characters other than newline and tab.
fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Finds the largest balanced `{…}` or `[…]` substring, string-aware.
fn largest_json_candidate(input: &str) -> Option<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut best: Option<(usize, usize)> = None;

    for (start, &open) in chars.iter().enumerate() {
        if open != '{' && open != '[' {
            continue;
        }
        // Skip starts inside an already-found candidate.
        if let Some((s, e)) = best
            && start > s
            && start < e
        {
            continue;
        }
        if let Some(end) = matching_close(&chars, start) {
            let len = end - start;
            if best.is_none_or(|(s, e)| len > e - s) {
                best = Some((start, end));
            }
        }
    }

    best.map(|(s, e)| chars[s..=e].iter().collect())
}

/// Index of the close bracket matching the open bracket at `start`.
fn matching_close(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Appends missing closing brackets to text that starts a JSON value but
/// never finishes it.
fn balance_closers(input: &str) -> Option<String> {
    let start = input.find(['{', '['])?;
    let body = &input[start..];

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }

    if stack.is_empty() {
        return None;
    }

    let mut repaired = body.trim_end().trim_end_matches(',').to_string();
    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_parses_directly() {
        assert_eq!(
            parse_loose(r#"{"intent": "weather"}"#),
            Some(json!({"intent": "weather"}))
        );
    }

    #[test]
    fn code_fences_are_stripped() {
        let fenced = "```json\n{\"steps\": []}\n```";
        assert_eq!(parse_loose(fenced), Some(json!({"steps": []})));
    }

    #[test]
    fn json_embedded_in_prose_is_extracted() {
        let chatty = "Sure! Here is the plan: {\"intent\": \"lookup\", \"steps\": [{\"tool\": \"weather\"}]} hope that helps.";
        let parsed = parse_loose(chatty).expect("embedded object");
        assert_eq!(parsed["intent"], "lookup");
        assert_eq!(parsed["steps"][0]["tool"], "weather");
    }

    #[test]
    fn unbalanced_braces_are_repaired() {
        let truncated = r#"{"intent": "lookup", "steps": [{"tool": "weather"}"#;
        let parsed = parse_loose(truncated).expect("repaired object");
        assert_eq!(parsed["intent"], "lookup");
    }

    #[test]
    fn control_characters_are_dropped() {
        let dirty = "{\"a\":\u{0007} 1}";
        assert_eq!(parse_loose(dirty), Some(json!({"a": 1})));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let tricky = r#"noise {"text": "a } in a string", "n": 2} trailing"#;
        let parsed = parse_loose(tricky).expect("string-aware extraction");
        assert_eq!(parsed["n"], 2);
    }

    #[test]
    fn hopeless_input_returns_none() {
        assert_eq!(parse_loose("no structure here at all"), None);
        assert_eq!(parse_loose(""), None);
    }
}
