//! Classified errors surfaced by the store and the authorization engine.

use http::StatusCode;

/// Errors classified by kind, each with a fixed wire status.
///
/// Authorization failures deliberately collapse into the single opaque
/// [`StoreError::NotAllowed`] variant so that callers cannot distinguish a
/// missing capability from a bad signature or a wrong target.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid data: {0}")]
    Data(String),
    #[error("malformed identifier: {0}")]
    Syntax(#[from] crate::id::IdError),
    #[error("not allowed")]
    NotAllowed,
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// The HTTP status this error maps to on the wire.
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Duplicate(_) | StoreError::InvalidState(_) => StatusCode::CONFLICT,
            StoreError::Data(_)
            | StoreError::Syntax(_)
            | StoreError::NotAllowed
            | StoreError::NotSupported(_) => StatusCode::BAD_REQUEST,
            StoreError::PermissionDenied => StatusCode::FORBIDDEN,
            StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put on the wire. Internal faults are not echoed.
    pub fn public_message(&self) -> String {
        match self {
            StoreError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StoreError::NotFound("document".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StoreError::Duplicate("document".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StoreError::InvalidState("sequence mismatch".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(StoreError::NotAllowed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(StoreError::PermissionDenied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_detail_is_not_echoed() {
        let err = StoreError::Internal("connection pool exhausted".into());
        assert_eq!(err.public_message(), "internal server error");
    }
}
