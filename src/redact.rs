//! Masking of sensitive values before they reach log output.
//!
//! Credentials, tokens and password hashes must never appear in logs, not
//! even on failure paths. Identifiers such as usernames are masked down to
//! their first and last characters so operators can still correlate events.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// The replacement text for scrubbed secrets.
const REDACTED: &str = "[REDACTED]";

/// Key fragments that mark a field as sensitive.
const SENSITIVE_KEYS: [&str; 17] = [
    "password",
    "pwd",
    "pass",
    "secret",
    "token",
    "key",
    "auth",
    "credential",
    "session",
    "cookie",
    "authorization",
    "bearer",
    "api_key",
    "apikey",
    "private",
    "confidential",
    "hash",
];

/// Patterns that match secret material embedded in free-form text.
static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Argon2 PHC strings
        r"\$argon2[a-z0-9]+\$[^\s]+",
        // bcrypt hashes
        r"\$2[ayb]\$\d{2}\$[./A-Za-z0-9]{53}",
        // key=value style secrets
        r#"(?i)(password|passwd|pwd|secret|token)['"]?\s*[:=]\s*['"]?([^\s'"]{4,})['"]?"#,
        // Bearer tokens in headers
        r"(?i)bearer\s+([a-zA-Z0-9_.=-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid secret pattern"))
    .collect()
});

/// Returns `true` when a field name indicates sensitive content.
///
/// Matching is case-insensitive and substring-based, so `userPassword`
/// and `SESSION_TOKEN` both count.
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|k| lowered.contains(k))
}

/// Masks a value down to its edge characters.
///
/// Short values collapse entirely so their length leaks nothing useful.
///
/// # Arguments
///
/// * `value` - The value to mask.
///
/// # Returns
///
/// The masked representation, e.g. `ma***er` for `manager`.
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0..=2 => "***".to_string(),
        3..=6 => format!("{}***{}", chars[0], chars[chars.len() - 1]),
        _ => format!(
            "{}{}***{}{}",
            chars[0],
            chars[1],
            chars[chars.len() - 2],
            chars[chars.len() - 1]
        ),
    }
}

/// Scrubs secret material out of a free-form string.
///
/// Returns the input unchanged when nothing matches.
pub fn scrub(input: &str) -> Cow<'_, str> {
    let mut result = Cow::Borrowed(input);

    for pattern in SECRET_PATTERNS.iter() {
        if pattern.is_match(&result) {
            result = Cow::Owned(pattern.replace_all(&result, REDACTED).into_owned());
        }
    }

    result
}
