//! Validation of identifiers and credentials received over HTTP.

/// Security-related constants for input validation
pub const MAX_RUN_ID_LENGTH: usize = 255;
pub const MAX_SEASON_LENGTH: usize = 64;

/// Security validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty run id provided")]
    EmptyRunId,
    #[error("Run id too long: exceeds {MAX_RUN_ID_LENGTH} characters")]
    RunIdTooLong,
    #[error("Invalid run id: contains path traversal or invalid characters")]
    InvalidRunId,
    #[error("Invalid season name")]
    InvalidSeason,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid bearer token")]
    InvalidToken,
}

/// Validate a run id before it is joined onto the runs root.
///
/// Run ids are single path components made of ASCII letters, digits, `-`,
/// `_` and `.`, and never start with a dot.
///
/// # Examples
///
/// ```
/// use amplicount::utils::validation::validate_run_id;
///
/// assert!(validate_run_id("210310_M01234_0042_000000000-ABCDE").is_ok());
/// assert!(validate_run_id("../etc").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyRunId` if the id is empty,
/// `ValidationError::RunIdTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidRunId` if it contains anything else.
pub fn validate_run_id(run_id: &str) -> Result<&str, ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::EmptyRunId);
    }

    if run_id.len() > MAX_RUN_ID_LENGTH {
        return Err(ValidationError::RunIdTooLong);
    }

    // Hidden directories, "." and ".." are all rejected here
    if run_id.starts_with('.') {
        return Err(ValidationError::InvalidRunId);
    }

    if !run_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::InvalidRunId);
    }

    Ok(run_id)
}

/// Validate a season name from a query string
///
/// # Errors
///
/// Returns `ValidationError::InvalidSeason` unless the name is 1 to
/// `MAX_SEASON_LENGTH` ASCII letters, digits, `-` or `_`.
pub fn validate_season(season: &str) -> Result<&str, ValidationError> {
    let valid = !season.is_empty()
        && season.len() <= MAX_SEASON_LENGTH
        && season
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if valid {
        Ok(season)
    } else {
        Err(ValidationError::InvalidSeason)
    }
}

/// Check an `Authorization` header value against the expected bearer token.
///
/// # Errors
///
/// Returns `ValidationError::MissingToken` if there is no bearer token, or
/// `ValidationError::InvalidToken` if it does not match.
pub fn check_bearer_token(header: Option<&str>, expected: &str) -> Result<(), ValidationError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ValidationError::MissingToken)?;

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidToken)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_run_id_safe() {
        assert!(validate_run_id("210310_M01234_0042_000000000-ABCDE").is_ok());
        assert!(validate_run_id("run.v2").is_ok());
        assert_eq!(validate_run_id("r1"), Ok("r1"));
    }

    #[test]
    fn test_validate_run_id_dangerous() {
        // Directory traversal attempts
        assert_eq!(validate_run_id(".."), Err(ValidationError::InvalidRunId));
        assert_eq!(validate_run_id("../etc"), Err(ValidationError::InvalidRunId));
        assert_eq!(validate_run_id("a/../../b"), Err(ValidationError::InvalidRunId));
        assert_eq!(validate_run_id("..\\windows"), Err(ValidationError::InvalidRunId));
        assert_eq!(validate_run_id("/etc/passwd"), Err(ValidationError::InvalidRunId));

        // Null bytes and control characters
        assert!(validate_run_id("run\0").is_err());
        assert!(validate_run_id("run\x01").is_err());

        // Hidden directories
        assert!(validate_run_id(".hidden").is_err());

        assert_eq!(validate_run_id(""), Err(ValidationError::EmptyRunId));
        assert_eq!(validate_run_id("   "), Err(ValidationError::EmptyRunId));
        assert_eq!(
            validate_run_id(&"a".repeat(300)),
            Err(ValidationError::RunIdTooLong)
        );
    }

    #[test]
    fn test_validate_season() {
        assert!(validate_season("winter-2021").is_ok());
        assert!(validate_season("").is_err());
        assert!(validate_season("../x").is_err());
        assert!(validate_season(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_check_bearer_token() {
        assert!(check_bearer_token(Some("Bearer s3cret"), "s3cret").is_ok());
        assert_eq!(
            check_bearer_token(Some("Bearer wrong"), "s3cret"),
            Err(ValidationError::InvalidToken)
        );
        assert_eq!(
            check_bearer_token(Some("Basic s3cret"), "s3cret"),
            Err(ValidationError::MissingToken)
        );
        assert_eq!(check_bearer_token(None, "s3cret"), Err(ValidationError::MissingToken));
        assert_eq!(
            check_bearer_token(Some("Bearer "), "s3cret"),
            Err(ValidationError::MissingToken)
        );
    }
}
