//! Core Twitter API utilities.
//!
//! Helpers shared by the request code: log sanitising and error-body parsing.

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_chars`: Maximum number of characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_chars {
        let truncated: String = sanitized.chars().take(max_chars).collect();
        format!("{}... [truncated, {} total bytes]", truncated, text.len())
    } else {
        sanitized
    }
}

/// Extracts the most specific error description from a Twitter API error body.
///
/// Problem responses carry `detail` and `title`; partial errors come as an
/// `errors` array. Anything else is returned sanitized.
pub(crate) fn api_error_message(body: &str) -> String {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return sanitize_for_logging(body, 200),
    };

    let field = |name: &str| json.get(name).and_then(|v| v.as_str()).map(str::to_string);

    field("detail")
        .or_else(|| field("title"))
        .or_else(|| {
            json.get("errors")
                .and_then(|e| e.get(0))
                .and_then(|e| e.get("message").or_else(|| e.get("detail")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_logging(body, 200))
}
