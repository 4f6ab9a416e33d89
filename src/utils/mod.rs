//! Utility helpers shared across modules

/// Truncate a string to at most `max_bytes` bytes, backing up to the nearest
/// UTF-8 char boundary. Used to keep upstream response bodies readable in logs.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Mask a secret for display: keeps the first four characters, replaces the
/// rest with an ellipsis. Short secrets are fully masked.
pub fn mask_secret(s: &str) -> String {
    if s.len() <= 4 {
        return "****".to_string();
    }
    let head: String = s.chars().take(4).collect();
    format!("{head}****")
}
