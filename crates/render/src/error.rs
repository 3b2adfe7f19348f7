//! Rendering pipeline errors.

use std::time::Duration;

use thiserror::Error;

/// The staging host refused to stage a node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("rendered node is empty")]
    EmptyNode,

    #[error("page width must be positive")]
    ZeroWidth,
}

/// Rasterization failed or produced an unusable bitmap.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture engine failed: {0}")]
    Engine(String),

    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("capture width {actual}px does not match requested {expected}px")]
    WidthMismatch { expected: u32, actual: u32 },

    #[error("capture of {width}x{height}px exceeds the pixel budget")]
    TooLarge { width: u32, height: u32 },

    #[error("capture scale must be at least 1")]
    InvalidScale,
}

impl CaptureError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}

/// Invalid input to the paginator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("bitmap is empty ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("page dimensions must be positive ({width}x{height})")]
    InvalidPageSize { width: u32, height: u32 },
}

/// Writing the page sequence into a document failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("no pages to assemble")]
    NoPages,

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("pdf write failed: {0}")]
    Pdf(String),

    #[error("assembler failed: {0}")]
    Engine(String),
}

impl AssemblyError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}
