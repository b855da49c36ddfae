use thiserror::Error;

use crate::ingest::{ExtractionError, IngestError, InputError, NormalizationError};
use crate::model::{ChangeError, ModelError};
use crate::render::ExportError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Change error: {0}")]
    Change(#[from] ChangeError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Invalid relationship type: {0}")]
    InvalidRelationshipKind(String),

    #[error("Invalid layout direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<IngestError> for Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Input(e) => Self::Input(e),
            IngestError::Normalization(e) => Self::Normalization(e),
        }
    }
}

impl Error {
    /// Stable machine-readable code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(InputError::MissingText) | Self::Normalization(_) => "MISSING_TEXT",
            Self::Input(InputError::TextTooShort { .. }) => "TEXT_TOO_SHORT",
            Self::Input(InputError::TextTooLong { .. }) => "TEXT_TOO_LONG",
            Self::Extraction(_) => "PROCESSING_ERROR",
            Self::Change(_) | Self::Model(_) => "INVALID_CHANGE",
            Self::Export(ExportError::UnsupportedFormat { .. }) => "UNSUPPORTED_FORMAT",
            Self::Export(ExportError::Serialization(_)) => "EXPORT_ERROR",
            Self::InvalidRelationshipKind(_) | Self::Serialization(_) => "INVALID_MODEL",
            Self::InvalidDirection(_) => "INVALID_REQUEST",
            Self::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether the caller can fix the request that produced this error.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Extraction(_) | Self::Config(_) | Self::Export(ExportError::Serialization(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_codes() {
        let short: Error = InputError::TextTooShort {
            length: 49,
            minimum: 50,
        }
        .into();
        assert_eq!(short.code(), "TEXT_TOO_SHORT");
        assert!(short.is_client_error());

        let missing: Error = InputError::MissingText.into();
        assert_eq!(missing.code(), "MISSING_TEXT");
    }

    #[test]
    fn test_ingest_error_conversion() {
        let err: Error = IngestError::Input(InputError::TextTooLong {
            length: 10_001,
            maximum: 10_000,
        })
        .into();
        assert_eq!(err.code(), "TEXT_TOO_LONG");
    }

    #[test]
    fn test_extraction_error_is_server_side() {
        let err: Error = ExtractionError::Failed("boom".into()).into();
        assert_eq!(err.code(), "PROCESSING_ERROR");
        assert!(!err.is_client_error());
    }
}
