//! Common validation utilities.

use std::collections::HashSet;

use validator::ValidationError;

/// Maximum length of an external user identifier.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Maximum length of a display name, in characters.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Maximum number of users a group invite may target.
pub const MAX_ELIGIBLE_USERS: usize = 256;

/// Spectator caps a host can pick from. There is no free-form entry.
pub const SPECTATOR_CAP_OPTIONS: [u32; 4] = [5, 10, 20, 50];

/// Validates an external user identifier (auth provider uid).
///
/// Must be non-empty, at most 128 characters and contain no whitespace.
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.is_empty() {
        let mut err = ValidationError::new("user_id_empty");
        err.message = Some("User id cannot be empty".into());
        return Err(err);
    }

    if user_id.len() > MAX_USER_ID_LENGTH {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some("User id cannot exceed 128 characters".into());
        return Err(err);
    }

    if user_id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("user_id_whitespace");
        err.message = Some("User id cannot contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a display name taken from a token or shown to other users.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some("Display name cannot exceed 100 characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a list of user identifiers for a group audience.
///
/// The list must be non-empty, bounded, free of duplicates, and every entry
/// must pass [`validate_user_id`].
pub fn validate_user_id_list(user_ids: &[String]) -> Result<(), ValidationError> {
    if user_ids.is_empty() {
        let mut err = ValidationError::new("user_ids_empty");
        err.message = Some("At least one eligible user is required".into());
        return Err(err);
    }

    if user_ids.len() > MAX_ELIGIBLE_USERS {
        let mut err = ValidationError::new("user_ids_length");
        err.message = Some("Cannot invite more than 256 users".into());
        return Err(err);
    }

    let mut seen = HashSet::with_capacity(user_ids.len());
    for user_id in user_ids {
        validate_user_id(user_id)?;
        if !seen.insert(user_id.as_str()) {
            let mut err = ValidationError::new("user_ids_duplicate");
            err.message = Some("Eligible users must be unique".into());
            return Err(err);
        }
    }

    Ok(())
}

/// Validates that a spectator cap is one of the offered options.
pub fn validate_spectator_cap(cap: u32) -> Result<(), ValidationError> {
    if SPECTATOR_CAP_OPTIONS.contains(&cap) {
        Ok(())
    } else {
        let mut err = ValidationError::new("spectator_cap_option");
        err.message = Some("Max spectators must be one of 5, 10, 20 or 50".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("u2").is_ok());
        assert!(validate_user_id("Xy8fQ2b1LmP0").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("has space").is_err());
        assert!(validate_user_id("tab\tinside").is_err());
    }

    #[test]
    fn test_validate_user_id_length_boundary() {
        let max = "a".repeat(MAX_USER_ID_LENGTH);
        assert!(validate_user_id(&max).is_ok());

        let too_long = "a".repeat(MAX_USER_ID_LENGTH + 1);
        let err = validate_user_id(&too_long).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "User id cannot exceed 128 characters"
        );
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Ada Lovelace").is_ok());
        assert!(validate_display_name("").is_ok());
        assert!(validate_display_name(&"é".repeat(MAX_DISPLAY_NAME_LENGTH)).is_ok());

        let err = validate_display_name(&"n".repeat(MAX_DISPLAY_NAME_LENGTH + 1)).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Display name cannot exceed 100 characters"
        );
    }

    #[test]
    fn test_validate_user_id_list() {
        assert!(validate_user_id_list(&["u2".to_string(), "u3".to_string()]).is_ok());
        assert!(validate_user_id_list(&[]).is_err());
        assert!(validate_user_id_list(&["u2".to_string(), "bad id".to_string()]).is_err());
    }

    #[test]
    fn test_validate_user_id_list_duplicates() {
        let err = validate_user_id_list(&["u2".to_string(), "u2".to_string()]).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Eligible users must be unique"
        );
    }

    #[test]
    fn test_validate_user_id_list_too_many() {
        let ids: Vec<String> = (0..=MAX_ELIGIBLE_USERS).map(|i| format!("u{}", i)).collect();
        assert!(validate_user_id_list(&ids).is_err());
        assert!(validate_user_id_list(&ids[..MAX_ELIGIBLE_USERS]).is_ok());
    }

    #[test]
    fn test_validate_spectator_cap() {
        for cap in SPECTATOR_CAP_OPTIONS {
            assert!(validate_spectator_cap(cap).is_ok());
        }
        assert!(validate_spectator_cap(0).is_err());
        assert!(validate_spectator_cap(7).is_err());
        assert!(validate_spectator_cap(100).is_err());
    }

    #[test]
    fn test_validate_spectator_cap_error_message() {
        let err = validate_spectator_cap(3).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Max spectators must be one of 5, 10, 20 or 50"
        );
    }
}
