//! Path string normalisation for user-supplied paths
//!
//! Paths typed on Windows or pasted from a file manager often arrive quoted
//! and with backslash separators. Mixxx stores forward slashes on every
//! platform, so replacement prefixes must use the same form to match.

/// Trim whitespace, strip one pair of surrounding double quotes and convert
/// backslashes to forward slashes.
pub fn normalize_path(raw: &str) -> String {
    trim_surround(raw.trim(), '"').replace('\\', "/")
}

/// Strip `pat` from both ends, but only when it appears at both ends.
pub fn trim_surround(subject: &str, pat: char) -> &str {
    match subject
        .strip_prefix(pat)
        .and_then(|rest| rest.strip_suffix(pat))
    {
        Some(inner) => inner,
        None => subject,
    }
}
