use crate::shared::infrastructure::document_store::DocumentStoreError;
use crate::shared::infrastructure::identity::IdentityError;
use thiserror::Error;

/// Caller-visible failure kinds. Each maps to exactly one transport status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfferError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type OfferResult<T> = Result<T, OfferError>;

impl From<DocumentStoreError> for OfferError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Unavailable(msg) => OfferError::DependencyUnavailable(msg),
            DocumentStoreError::Conflict { collection, id } => {
                OfferError::Conflict(format!("concurrent write on {collection}/{id}"))
            }
            DocumentStoreError::Serialization(msg) | DocumentStoreError::Backend(msg) => {
                OfferError::Internal(msg)
            }
        }
    }
}

impl From<IdentityError> for OfferError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingToken => OfferError::Unauthenticated(err.to_string()),
            IdentityError::Unavailable(msg) => OfferError::DependencyUnavailable(msg),
            IdentityError::Malformed(_) | IdentityError::Expired | IdentityError::Invalid(_) => {
                OfferError::Unauthenticated("Invalid or expired token".into())
            }
        }
    }
}
