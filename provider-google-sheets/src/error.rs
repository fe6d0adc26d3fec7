//! Error types for the Google Sheets provider

use thiserror::Error;

/// Google Sheets provider errors
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Invalid or contradictory configuration; never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The sheet content does not have the expected shape
    #[error("Unexpected spreadsheet data: {0}")]
    DataShape(String),

    /// The upsert criteria matched several rows
    #[error("More than one row found where {criteria} = {value:?} ({count} matches)")]
    AmbiguousMatch {
        criteria: String,
        value: String,
        count: usize,
    },

    /// API request returned a non-success status other than 401/403
    #[error("Google API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Token acquisition failed or the refreshed token was rejected
    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl SheetsError {
    /// Whether retrying the same invocation could succeed
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SheetsError::Configuration(_)
                | SheetsError::AmbiguousMatch { .. }
                | SheetsError::Runtime(core_runtime::Error::Config(_))
                | SheetsError::Runtime(core_runtime::Error::MissingField(_))
        )
    }
}

/// Result type for Google Sheets operations
pub type Result<T> = std::result::Result<T, SheetsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SheetsError::ApiError {
            status_code: 404,
            message: "Requested entity was not found.".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google API error (status 404): Requested entity was not found."
        );
    }

    #[test]
    fn test_ambiguous_match_message() {
        let error = SheetsError::AmbiguousMatch {
            criteria: "Email".to_string(),
            value: "ada@example.com".to_string(),
            count: 2,
        };

        assert!(error.to_string().starts_with("More than one row found"));
        assert!(error.is_configuration());
    }

    #[test]
    fn test_auth_error_stays_distinguishable() {
        let error: SheetsError = core_auth::AuthError::Unauthorized {
            status: 401,
            body: "invalid_grant".to_string(),
        }
        .into();

        assert!(matches!(error, SheetsError::Auth(ref e) if e.is_unauthorized()));
        assert!(!error.is_configuration());
    }
}
