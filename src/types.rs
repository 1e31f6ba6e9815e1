//! Common types and errors

use hyper::StatusCode;
use thiserror::Error;

/// Toyshop error type
#[derive(Error, Debug)]
pub enum ToyshopError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToyshopError {
    /// The HTTP status this error maps to at the boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToyshopError::NotFound(_) => StatusCode::NOT_FOUND,
            ToyshopError::Forbidden(_) => StatusCode::FORBIDDEN,
            ToyshopError::Auth(_) => StatusCode::UNAUTHORIZED,
            ToyshopError::Conflict(_) => StatusCode::CONFLICT,
            ToyshopError::Http(_) => StatusCode::BAD_REQUEST,
            ToyshopError::Database(_) | ToyshopError::Config(_) | ToyshopError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type alias for toyshop operations
pub type Result<T> = std::result::Result<T, ToyshopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ToyshopError::NotFound("toy".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ToyshopError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ToyshopError::Auth("bad token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ToyshopError::Conflict("taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ToyshopError::Http("bad body".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ToyshopError::Database("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_carries_context() {
        let err = ToyshopError::NotFound("toy 123".into());
        assert_eq!(err.to_string(), "Not found: toy 123");
    }
}
