//! Name normalisation and validation
//!
//! Names are keyed case-folded everywhere; the original casing is only kept
//! for display.

use crate::error::{Error, Result};

/// Longest accepted name (a dashed account UUID is 36 characters)
const MAX_NAME_LEN: usize = 36;

/// Longest accepted cross-platform gamertag
const MAX_GAMERTAG_LEN: usize = 32;

/// Fold a name to its lookup key
pub fn case_fold(name: &str) -> String {
    name.to_lowercase()
}

/// Validate a player name (or account UUID) before it is sent upstream
///
/// Accepts ASCII letters, digits, `_` and `-`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("Name cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "Name too long: {} chars (max {}). Got: {}",
            name.len(),
            MAX_NAME_LEN,
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::invalid_input(format!(
            "Name contains invalid characters: '{}'. Valid: letters, digits, '_' and '-'.",
            name
        )));
    }

    Ok(())
}

/// Validate a cross-platform gamertag
///
/// Gamertags may contain spaces; they are URL-encoded by the lookup client.
pub fn validate_gamertag(gamertag: &str) -> Result<()> {
    let trimmed = gamertag.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input("Gamertag cannot be empty"));
    }

    if trimmed.chars().count() > MAX_GAMERTAG_LEN {
        return Err(Error::invalid_input(format!(
            "Gamertag too long (max {} chars): {}",
            MAX_GAMERTAG_LEN, trimmed
        )));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(Error::invalid_input("Gamertag contains control characters"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_fold() {
        assert_eq!(case_fold("Steve"), "steve");
        assert_eq!(case_fold("ALEX_01"), "alex_01");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Steve").is_ok());
        assert!(validate_name("069a79f4-44e9-4726-a5be-fca90e38aaf5").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name(&"a".repeat(37)).is_err());
    }

    #[test]
    fn test_validate_gamertag() {
        assert!(validate_gamertag("Some Gamer").is_ok());
        assert!(validate_gamertag("   ").is_err());
        assert!(validate_gamertag("bad\ttag").is_err());
    }
}
