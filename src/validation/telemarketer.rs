use chrono::NaiveDate;

use crate::error::{AppError, Result};

/// Validates a performance month in `YYYY-MM` form.
///
/// # Arguments
///
/// * `month` - The month string to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the month is a real calendar month.
pub fn validate_performance_month(month: &str) -> Result<()> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Invalid performance month: {}", month))
    })?;

    Ok(())
}

/// Validates a telemarketer display name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".to_string()));
    }

    if name.len() > 255 {
        return Err(AppError::Validation(
            "Name must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}
