//! Environment variable parsing utilities
//!
//! Lenient parsing: a missing or malformed value falls back to the default.

use std::str::FromStr;

/// Parse an environment variable with a default fallback
///
/// # Example
/// ```ignore
/// let port: u16 = parse_env_with_default("PORT", 8000);
/// let timeout: u64 = parse_env_with_default("TIMEOUT_SECS", 30);
/// ```
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an environment variable, returning Option (None if missing or invalid)
///
/// # Example
/// ```ignore
/// let custom_host = parse_env_optional::<String>("CUSTOM_HOST");
/// if let Some(host) = custom_host {
///     println!("Using custom host: {}", host);
/// }
/// ```
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse a comma-separated list, dropping blank entries
///
/// Falls back to `default` when the variable is unset.
pub fn parse_env_list(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
