//! Request-serving and listener error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ServeError {
    #[error("admission rejected: {message}")]
    AdmissionRejected { message: String },

    #[error("context canceled")]
    Cancelled,

    #[error("failed writing index.yaml: {message}")]
    WriteFailed { message: String },

    #[error("listen {addr}: {message}")]
    BindFailed { addr: String, message: String },

    #[error("server failed: {message}")]
    Server { message: String },
}

impl ServeError {
    /// Failures scoped to a single request, reported to that client only.
    #[must_use]
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            Self::AdmissionRejected { .. } | Self::Cancelled | Self::WriteFailed { .. }
        )
    }
}

impl UserFacingError for ServeError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::BindFailed { .. } => {
                Some("Choose a free address with --listen-addr or stop the other listener.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.is_per_request()
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::AdmissionRejected { .. } => "serve.admission_rejected",
            Self::Cancelled => "serve.cancelled",
            Self::WriteFailed { .. } => "serve.write_failed",
            Self::BindFailed { .. } => "serve.bind_failed",
            Self::Server { .. } => "serve.server_failed",
        };
        Some(code)
    }
}
