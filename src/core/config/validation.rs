//! Validation helper functions for configuration types.

use globset::Glob;

use crate::core::errors::{HatError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(HatError::validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(HatError::validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

/// Validate that `min <= max` and both are finite.
pub fn validate_ordered_range(min: f64, max: f64, field: &str) -> Result<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(HatError::validation(format!(
            "{} bounds must be finite numbers",
            field
        )));
    }
    if min > max {
        return Err(HatError::validation(format!(
            "{} minimum ({}) exceeds maximum ({})",
            field, min, max
        )));
    }
    Ok(())
}

/// Validate that a string is not empty or whitespace.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HatError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Validate that a string is a single path segment.
pub fn validate_path_segment(value: &str, field: &str) -> Result<()> {
    validate_non_empty(value, field)?;
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(HatError::validation(format!(
            "{} must be a single directory name, got '{}'",
            field, value
        )));
    }
    Ok(())
}

/// Validate that every pattern compiles as a glob.
pub fn validate_glob_patterns(patterns: &[String], field: &str) -> Result<()> {
    for pattern in patterns {
        Glob::new(pattern).map_err(|e| {
            HatError::config_field(format!("Invalid pattern '{pattern}': {e}"), field)
        })?;
    }
    Ok(())
}

/// Validate a dotted `major.minor[.patch]` version string.
pub fn validate_version(value: &str, field: &str) -> Result<()> {
    let numeric = value.split_whitespace().next().unwrap_or_default();
    let parts: Vec<&str> = numeric.split('.').collect();
    let well_formed = parts.len() >= 2
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(HatError::validation(format!(
            "{} must look like 4.2 or 4.2.1, got '{}'",
            field, value
        )));
    }
    Ok(())
}
