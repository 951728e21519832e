//! # Error Types Module
//!
//! Defines every failure the conversion pipeline can surface to a caller.
//!
//! ## Responsibilities:
//! - `ConvertError` enum categorising all pipeline failures
//! - Each variant carries the offending path or value plus a readable reason
//! - `ErrorKind` fieldless mirror for matching, logging and exit codes
//!
//! ## Categories:
//! - `NotFound`: input path does not exist
//! - `InvalidInput`: not a regular file, or content unreadable as an image
//! - `UnsupportedFormat`: extension or sniffed MIME type outside the allow-list
//! - `TooLarge`: input exceeds the configured size cap
//! - `CapabilityUnavailable`: host lacks a working codec
//! - `InvalidConfiguration`: options or config out of range
//! - `ConversionFailed`: decode failed or produced no usable surface
//! - `WriteFailed`: directory creation, encode or post-write check failed
//!
//! ## Example:
//! ```rust
//! use webp_converter::{ConvertError, ErrorKind};
//!
//! let err = ConvertError::NotFound { path: "missing.jpg".into() };
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! ```

use std::fmt;
use std::path::PathBuf;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Custom error types for image conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid image file: {}. {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Unsupported image format: {format}. Supported formats are: JPEG, PNG, GIF, BMP.")]
    UnsupportedFormat { format: String },

    #[error("Image file is too large: {} ({size} bytes). Maximum allowed size: {limit} bytes.", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Image codec capability is not available: {reason}")]
    CapabilityUnavailable { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Failed to convert image: {}. Reason: {reason}", path.display())]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("Failed to write output file: {}. Reason: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },
}

/// Fieldless discriminant of [`ConvertError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UnsupportedFormat,
    TooLarge,
    CapabilityUnavailable,
    InvalidConfiguration,
    ConversionFailed,
    WriteFailed,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::CapabilityUnavailable { .. } => ErrorKind::CapabilityUnavailable,
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            Self::WriteFailed { .. } => ErrorKind::WriteFailed,
        }
    }

    pub(crate) fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conversion_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::UnsupportedFormat => "unsupported_format",
            Self::TooLarge => "too_large",
            Self::CapabilityUnavailable => "capability_unavailable",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::ConversionFailed => "conversion_failed",
            Self::WriteFailed => "write_failed",
        };
        f.write_str(name)
    }
}
