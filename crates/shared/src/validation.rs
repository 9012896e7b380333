//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a player's display name, in characters, after trimming.
pub const MAX_PLAYER_NAME_LENGTH: usize = 50;

/// Normalizes a player name for duplicate detection.
///
/// Only used for comparison and indexing; the stored name keeps its original form.
pub fn normalize_player_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates that a player name is non-blank and not too long.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name cannot be empty".into());
        return Err(err);
    }
    if trimmed.chars().count() > MAX_PLAYER_NAME_LENGTH {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!(
                "Player name must be at most {} characters",
                MAX_PLAYER_NAME_LENGTH
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates that a fee amount is a finite, non-negative number.
pub fn validate_fee(fee: f64) -> Result<(), ValidationError> {
    if fee.is_finite() && fee >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("fee_range");
        err.message = Some("Fee must be a non-negative number".into());
        Err(err)
    }
}
