//! Length bounds for free-text failure detail.

/// Maximum stored length of an error message, in characters.
pub const MAX_ERROR_MESSAGE_LEN: usize = 2000;
/// Maximum stored length of a stack trace, in characters.
pub const MAX_STACK_TRACE_LEN: usize = 5000;

const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `max` characters, marking the cut with `...`.
///
/// A bound too small for the marker keeps the first `max` characters unmarked.
pub fn sanitize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    if max < ELLIPSIS.len() {
        return text.chars().take(max).collect();
    }

    let mut out: String = text.chars().take(max - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Bound an error message; blank input yields `None`.
pub fn error_message(text: Option<&str>) -> Option<String> {
    bounded(text, MAX_ERROR_MESSAGE_LEN)
}

/// Bound a stack trace; blank input yields `None`.
pub fn stack_trace(text: Option<&str>) -> Option<String> {
    bounded(text, MAX_STACK_TRACE_LEN)
}

fn bounded(text: Option<&str>, max: usize) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
        .map(|t| sanitize(t, max))
}
