//! String utilities for the domain layer.

/// Byte budget for chat titles derived from the first user message.
pub const TITLE_MAX_BYTES: usize = 50;

/// Longest prefix of `s` that fits in `max_bytes` without splitting a
/// UTF-8 character.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten a title to [`TITLE_MAX_BYTES`], appending `...` when cut.
///
/// The ellipsis is added after the budget, not inside it, matching how the
/// chat backend titles its stored conversations.
pub fn truncate_title(s: &str) -> String {
    let head = truncate_str(s, TITLE_MAX_BYTES);
    if head.len() < s.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
