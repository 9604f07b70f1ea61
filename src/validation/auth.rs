use crate::error::{AppError, Result};

/// Validates a username.
///
/// # Arguments
///
/// * `username` - The username to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the username is valid.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.len() < 3 {
        return Err(AppError::Validation(
            "Username must be at least 3 characters long".to_string(),
        ));
    }

    if username.len() > 255 {
        return Err(AppError::Validation(
            "Username must be at most 255 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// The characters counted as special for strength scoring.
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A password strength assessment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordStrength {
    /// How many of the five rules the password satisfies.
    pub score: u8,
    /// Whether the password is acceptable (three rules or more).
    pub is_valid: bool,
    /// One message per unmet rule.
    pub feedback: Vec<String>,
}

/// Scores a password against five rules: length of at least 8,
/// lowercase, uppercase, digits, and special characters.
///
/// # Arguments
///
/// * `password` - The password to score.
///
/// # Returns
///
/// A `PasswordStrength` with the score and per-rule feedback.
pub fn password_strength(password: &str) -> PasswordStrength {
    let mut score = 0u8;
    let mut feedback = Vec::new();

    if password.len() >= 8 {
        score += 1;
    } else {
        feedback.push("Use at least 8 characters".to_string());
    }

    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    } else {
        feedback.push("Add lowercase letters".to_string());
    }

    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    } else {
        feedback.push("Add uppercase letters".to_string());
    }

    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    } else {
        feedback.push("Add digits".to_string());
    }

    if password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        score += 1;
    } else {
        feedback.push("Add special characters".to_string());
    }

    PasswordStrength {
        score,
        is_valid: score >= 3,
        feedback,
    }
}
