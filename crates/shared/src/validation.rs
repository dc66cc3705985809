//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length for resource and organization names.
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum length for resource descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

lazy_static! {
    /// Serial numbers are alphanumeric with optional dashes, e.g. "C02ZK1EFLVDL" or "SN-1234-AB".
    static ref SERIAL_NUM_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,49}$").unwrap();
}

/// Validates that a resource/org/team name is non-empty and within length limits.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(format!("Name must be 1-{} characters", MAX_NAME_LENGTH).into());
        return Err(err);
    }
    Ok(())
}

/// Validates a resource serial number.
pub fn validate_serial_num(serial: &str) -> Result<(), ValidationError> {
    if SERIAL_NUM_RE.is_match(serial) {
        Ok(())
    } else {
        let mut err = ValidationError::new("serial_num_format");
        err.message =
            Some("Serial number must be alphanumeric (dashes allowed), max 50 characters".into());
        Err(err)
    }
}

/// Validates a resource description length.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.len() <= MAX_DESCRIPTION_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("description_length");
        err.message = Some(
            format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )
            .into(),
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Laptop-12").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert!(validate_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_serial_num() {
        assert!(validate_serial_num("C02ZK1EFLVDL").is_ok());
        assert!(validate_serial_num("SN-1234-AB").is_ok());
        assert!(validate_serial_num("").is_err());
        assert!(validate_serial_num("-leading-dash").is_err());
        assert!(validate_serial_num("has space").is_err());
        assert!(validate_serial_num(&"9".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"d".repeat(2000)).is_ok());
        assert!(validate_description(&"d".repeat(2001)).is_err());
    }
}
