//! Small utility helpers shared across the crate.

use std::env;

/// Return the first non-empty environment variable from `keys`, or `None`.
pub fn env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Normalise a URL by prepending `http://` or `https://` when the scheme is missing.
pub fn normalize_url(raw: &str) -> String {
    if raw.contains("://") {
        return raw.to_string();
    }
    let authority = raw.split('/').next().unwrap_or(raw);
    let plain_http_port = authority.rsplit_once(':').is_some_and(|(_, port)| port == "80");
    let scheme = if raw.starts_with("localhost") || raw.starts_with("127.") || plain_http_port {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{raw}")
}

/// Join an API base URL and a relative endpoint path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Mask a secret for display, keeping only the first few characters.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(8).collect();
    if key.chars().count() <= 8 {
        format!("{visible}…")
    } else {
        format!("{visible}...")
    }
}
