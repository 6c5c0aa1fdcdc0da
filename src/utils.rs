use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

pub const SESSION_ID_LEN: usize = 64;
pub const STATE_LEN: usize = 32;

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates a new session id for the session cookie.
///
/// # Returns
///
/// A string of [`SESSION_ID_LEN`] random ASCII letters and digits, drawn
/// from the thread-local generator.
///
/// # Example
///
/// ```
/// let id = generate_session_id();
/// assert_eq!(id.len(), 64);
/// ```
pub fn generate_session_id() -> String {
    random_alphanumeric(SESSION_ID_LEN)
}

/// Anti-forgery value sent as `state` with the authorize request.
pub fn generate_state() -> String {
    random_alphanumeric(STATE_LEN)
}

/// Current Unix time in whole seconds (UTC).
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// First characters of a session id, enough to correlate log lines.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
