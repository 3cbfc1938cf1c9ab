use crate::codes;
use crate::context::ErrorContext;
use thiserror::Error;

/// Workspace-wide error enum
#[derive(Error, Debug)]
pub enum YatraError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server startup and runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Authentication/authorization errors
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Business rule violations (workflow, uniqueness, allocation)
    #[error("Business logic error: {0}")]
    BusinessError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Record lookups that found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl YatraError {
    /// Machine-readable code for this error
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => codes::validation::MISSING_REQUIRED_FIELD,
            Self::AuthError(_) => codes::authentication::INVALID_CREDENTIALS,
            Self::DatabaseError(_) => codes::database::QUERY_FAILED,
            Self::BusinessError(_) => codes::business::INVALID_STATE_TRANSITION,
            Self::NotFound(_) => codes::business::NOT_FOUND,
            Self::ConfigError(_) => codes::system::CONFIGURATION,
            Self::NetworkError(_) => codes::system::SERVICE_UNAVAILABLE,
            Self::ServerError(_) | Self::InternalError(_) | Self::Other(_) => {
                codes::system::INTERNAL
            }
        }
    }

    /// Short category name used in structured logs
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "network",
            Self::ServerError(_) => "server",
            Self::AuthError(_) => "auth",
            Self::DatabaseError(_) => "database",
            Self::BusinessError(_) => "business",
            Self::ValidationError(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::InternalError(_) | Self::Other(_) => "internal",
            Self::ConfigError(_) => "config",
        }
    }
}

/// Result type alias for YatraSathi operations
pub type Result<T> = std::result::Result<T, YatraError>;

/// Emit a structured error event with its context
pub fn log_error(context: &ErrorContext, error: &YatraError) {
    tracing::error!(
        error_code = error.code(),
        error_type = error.error_type(),
        request_id = context.request_id.as_deref().unwrap_or("-"),
        user_id = context.user_id.as_deref().unwrap_or("-"),
        entity = context.entity.as_deref().unwrap_or("-"),
        details = %serde_json::to_string(&context.additional).unwrap_or_default(),
        "{error}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category() {
        assert_eq!(
            YatraError::NotFound("booking".into()).code(),
            codes::business::NOT_FOUND
        );
        assert_eq!(
            YatraError::ConfigError("missing jwt secret".into()).code(),
            codes::system::CONFIGURATION
        );
        assert_eq!(
            YatraError::from(anyhow::anyhow!("boom")).error_type(),
            "internal"
        );
    }

    #[test]
    fn display_includes_category() {
        let err = YatraError::BusinessError("booking already billed".into());
        assert_eq!(err.to_string(), "Business logic error: booking already billed");
    }
}
