//! Error types for the bounty board client

use thiserror::Error;

use crate::lifecycle::{ClassifiedError, ErrorKind};

/// Local, pre-flight validation failures.
///
/// These never reach the lifecycle controller; the caller fixes the input
/// and tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Reward is not a decimal amount
    #[error("invalid reward amount: {0}")]
    InvalidReward(String),

    /// Reward parsed but is zero or negative
    #[error("reward must be greater than zero")]
    NonPositiveReward,

    /// No deadline date selected
    #[error("a deadline date is required")]
    MissingDeadline,

    /// Time is not HH:MM
    #[error("invalid deadline time: {0}")]
    InvalidTime(String),

    /// Date and time do not resolve to a single instant in the zone
    #[error("deadline does not resolve to a valid instant")]
    UnresolvableDeadline,

    /// Proof has neither files nor links
    #[error("Please upload at least one file or add a link as proof")]
    NoProofArtifacts,

    /// Link is not a well-formed URL
    #[error("Please enter a valid URL")]
    InvalidUrl(String),

    /// Index outside the collection
    #[error("no item at index {0}")]
    IndexOutOfRange(usize),
}

/// Raw failure reported by the wallet or chain provider.
///
/// `code` carries the provider's numeric error code when there is one
/// (EIP-1193 uses 4001 for a user rejection).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Content-addressed storage failures
#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport-level failure talking to the storage service
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("storage service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Service answered but the body was not what we expected
    #[error("unexpected storage response: {0}")]
    InvalidResponse(String),

    /// Serialization of an uploaded document failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the backend reports
    #[error("{0}")]
    Backend(String),
}

impl StorageError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Http(e) => e.is_timeout() || e.is_connect(),
            StorageError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Failure of the proof packaging pipeline, naming the step that failed
#[derive(Error, Debug)]
pub enum PackagingError {
    /// One of the attached files could not be uploaded
    #[error("failed to upload file '{name}': {source}")]
    FileUpload {
        name: String,
        #[source]
        source: StorageError,
    },

    /// Metadata could not be serialized
    #[error("failed to serialize proof metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The metadata record could not be uploaded
    #[error("failed to upload proof metadata: {0}")]
    MetadataUpload(#[source] StorageError),

    /// Storage returned an empty identifier for the metadata
    #[error("storage returned an empty identifier for the proof metadata")]
    EmptyIdentifier,
}

/// Errors surfaced by the bounty board flows
#[derive(Error, Debug)]
pub enum BountyError {
    /// Local validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Proof packaging failed before anything was sent on-chain
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// The on-chain write failed; the message is already user-facing
    #[error(transparent)]
    Transaction(#[from] ClassifiedError),

    /// Direct storage error outside the packaging pipeline
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BountyError {
    /// Classification of this error in the user-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            BountyError::Validation(_) => ErrorKind::Validation,
            BountyError::Packaging(_) | BountyError::Storage(_) => ErrorKind::Packaging,
            BountyError::Transaction(e) => e.kind,
            BountyError::Configuration(_) | BountyError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// Single message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            BountyError::Transaction(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for bounty board operations
pub type Result<T> = std::result::Result<T, BountyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            BountyError::from(ValidationError::NoProofArtifacts).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BountyError::from(PackagingError::EmptyIdentifier).kind(),
            ErrorKind::Packaging
        );
        assert_eq!(
            BountyError::Configuration("x".to_string()).kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            BountyError::Internal("x".to_string()).kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_transaction_message_is_shown_as_is() {
        let err = BountyError::from(ClassifiedError::new(ErrorKind::UserRejected, "nope"));
        assert_eq!(err.user_message(), "nope");
        assert_eq!(err.kind(), ErrorKind::UserRejected);
    }
}
