//! Export errors.

use thiserror::Error;

use quoteprint_render::{AssemblyError, CaptureError, PaginationError, StagingError};

use crate::sink::SinkError;

/// Text of the single alert shown when an export fails.
pub const FAILURE_MESSAGE: &str = "Failed to generate PDF. Please try again.";

/// The user-facing failure class of an export error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Staging,
    Capture,
    Pagination,
    Assembly,
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export is in flight. Not a failure of that export.
    #[error("an export is already in progress")]
    Busy,

    #[error("staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("pagination failed: {0}")]
    Pagination(#[from] PaginationError),

    #[error("assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("emitting the document failed: {0}")]
    Sink(#[from] SinkError),
}

impl ExportError {
    /// `None` for [`ExportError::Busy`]. Sink failures count as assembly
    /// failures: the document never reached the user.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ExportError::Busy => None,
            ExportError::Staging(_) => Some(FailureKind::Staging),
            ExportError::Capture(_) => Some(FailureKind::Capture),
            ExportError::Pagination(_) => Some(FailureKind::Pagination),
            ExportError::Assembly(_) | ExportError::Sink(_) => Some(FailureKind::Assembly),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::Busy => "An export is already in progress.",
            _ => FAILURE_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sink_failures_are_assembly_failures() {
        let err = ExportError::from(SinkError::EmptyDocument);
        assert_eq!(err.kind(), Some(FailureKind::Assembly));
        assert_eq!(err.user_message(), FAILURE_MESSAGE);
    }

    #[test]
    fn busy_is_not_a_failure() {
        assert_eq!(ExportError::Busy.kind(), None);
        assert_ne!(ExportError::Busy.user_message(), FAILURE_MESSAGE);
    }

    #[test]
    fn capture_errors_keep_their_cause() {
        let err = ExportError::from(CaptureError::Timeout(Duration::from_secs(2)));
        assert_eq!(err.kind(), Some(FailureKind::Capture));
        assert!(err.to_string().contains("timed out"));
    }
}
