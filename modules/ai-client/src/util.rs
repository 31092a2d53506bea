/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip a markdown code fence wrapped around a JSON body.
///
/// Models asked for a bare JSON object occasionally wrap it in
/// ```` ```json ```` anyway. Anything that is not fenced is returned trimmed.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
