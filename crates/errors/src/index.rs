//! Index construction and validation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("duplicate chart entry: {name} {version}")]
    DuplicateEntry { name: String, version: String },

    #[error("invalid chart entry {name}: {message}")]
    InvalidEntry { name: String, message: String },

    #[error("invalid version {version} for chart {name}: {message}")]
    InvalidVersion {
        name: String,
        version: String,
        message: String,
    },

    #[error("failed to marshal index.yaml: {message}")]
    SerializationFailed { message: String },

    #[error("failed to unmarshal index.yaml: {message}")]
    DeserializationFailed { message: String },

    #[error("error looking for chart in index.yaml: {name} {version} lost or altered in round trip")]
    RoundTripIntegrity { name: String, version: String },

    #[error("chart not found: {name} {version}")]
    NotFound { name: String, version: String },
}

impl UserFacingError for IndexError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateEntry { .. } => {
                Some("Remove the repeated name/version pair from the catalog.")
            }
            Self::InvalidEntry { .. } | Self::InvalidVersion { .. } => {
                Some("Fix the catalog entry noted in the error message.")
            }
            Self::SerializationFailed { .. }
            | Self::DeserializationFailed { .. }
            | Self::RoundTripIntegrity { .. } => {
                Some("The index format is not self-consistent; this is a bug, please report it.")
            }
            Self::NotFound { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DuplicateEntry { .. } => "index.duplicate_entry",
            Self::InvalidEntry { .. } => "index.invalid_entry",
            Self::InvalidVersion { .. } => "index.invalid_version",
            Self::SerializationFailed { .. } => "index.serialization_failed",
            Self::DeserializationFailed { .. } => "index.deserialization_failed",
            Self::RoundTripIntegrity { .. } => "index.round_trip_integrity",
            Self::NotFound { .. } => "index.not_found",
        };
        Some(code)
    }
}
