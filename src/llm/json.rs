//! Lenient JSON extraction for model output.
//!
//! Models often wrap JSON in Markdown fences or surround it with prose. The
//! helpers here recover the object without a second round trip.

use serde_json::Value;

/// Longest raw excerpt included in parse-failure messages.
pub const MAX_EXCERPT_CHARS: usize = 200;

/// Strip one fenced code block when it encloses the whole payload.
///
/// A fence in the middle of prose is left alone.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```")) || trimmed.len() < 6 {
        return trimmed;
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    // Drop the info string (```json, ```markdown) on the opening line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

/// Parse a JSON value out of `text`.
///
/// Tries, in order:
/// 1. The whole (fence-stripped) text
/// 2. The first balanced `{...}` span that parses, scanning each `{`
/// 3. The greedy span from the first `{` to the last `}`
///
/// On failure returns the error from the direct parse.
pub fn parse_lenient(text: &str) -> Result<Value, String> {
    let candidate = strip_code_fence(text);

    let direct_err = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    if let Some(value) = find_valid_json_object(candidate) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&candidate[start..=end])
    {
        return Ok(value);
    }

    Err(direct_err)
}

/// Truncate `text` for inclusion in an error message.
pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_EXCERPT_CHARS).collect();
    format!("{}...", head)
}

fn find_valid_json_object(text: &str) -> Option<Value> {
    for (start_idx, _) in text.match_indices('{') {
        if let Some(span) = extract_balanced_braces(&text[start_idx..])
            && let Ok(value) = serde_json::from_str::<Value>(span)
        {
            return Some(value);
        }
    }
    None
}

/// Slice from the leading `{` to its matching `}`, respecting string literals.
fn extract_balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
