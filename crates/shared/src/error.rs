//! Application-wide error types.
//!
//! `AppError` is what binaries and any transport layer see. Domain crates
//! keep their own error enums and convert into it.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error, grouped by how a caller should react.
#[derive(Debug, Error)]
pub enum AppError {
    /// The actor may not perform the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The resource does not exist for this company.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is not allowed in the resource's current state.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// A uniqueness rule would be broken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status a transport layer would answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BusinessRule(_) => 422,
            Self::Database(_) | Self::Config(_) => 500,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("bad amount".into()), 400, "VALIDATION_ERROR")]
    #[case(AppError::Forbidden("not the owner".into()), 403, "FORBIDDEN")]
    #[case(AppError::NotFound("report".into()), 404, "NOT_FOUND")]
    #[case(AppError::Conflict("already bound".into()), 409, "CONFLICT")]
    #[case(AppError::BusinessRule("report is approved".into()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::Database("connection reset".into()), 500, "DATABASE_ERROR")]
    #[case(AppError::Config("missing url".into()), 500, "CONFIG_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_config_error_converts() {
        let err: AppError = config::ConfigError::NotFound("database.url".into()).into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("database.url"));
    }
}
