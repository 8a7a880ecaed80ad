//! Errors specific to parsing a PE image or transplanting its header.

use alloc::{collections::TryReserveError, string::String};
use core::fmt;

#[cfg(feature = "std")]
use std::io::Error as IOError;

/// Error that can occur when reading and parsing bytes.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(feature = "std", error("{0}"))]
pub struct ReadError(pub String);

/// Errors that can occur when reading a PE image.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ImageReadError {
    #[cfg_attr(feature = "std", error("invalid bytes: {0}"))]
    InvalidBytes(ReadError),
    #[cfg_attr(feature = "std", error("invalid header: {0}"))]
    InvalidHeader(String),
    #[cfg_attr(feature = "std", error("invalid section: {0}"))]
    InvalidSection(String),
    #[cfg_attr(feature = "std", error("allocation failed: {0}"))]
    AllocationFailed(TryReserveError),
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for ImageReadError {
    fn from(error: ReadError) -> Self { ImageReadError::InvalidBytes(error) }
}
impl From<TryReserveError> for ImageReadError {
    fn from(error: TryReserveError) -> Self { ImageReadError::AllocationFailed(error) }
}
#[cfg(feature = "std")]
impl From<IOError> for ImageReadError {
    fn from(error: IOError) -> Self { ImageReadError::IOError(error) }
}

/// Step of a header transplant at which a failure occurred.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TransplantStep {
    Open,
    CopyHeader,
    RestoreResourceEntry,
    CopySections,
}
impl fmt::Display for TransplantStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransplantStep::Open => write!(f, "opening images"),
            TransplantStep::CopyHeader => write!(f, "copying header"),
            TransplantStep::RestoreResourceEntry => write!(f, "restoring resource entry"),
            TransplantStep::CopySections => write!(f, "copying section table"),
        }
    }
}

/// Role of an image in a header transplant.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ImageRole {
    Source,
    Target,
}
impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Source => write!(f, "source"),
            ImageRole::Target => write!(f, "target"),
        }
    }
}

#[cfg(feature = "std")]
/// Errors that can occur when transplanting a header between images.
#[derive(Debug, thiserror::Error)]
pub enum TransplantError {
    #[error("io error while {0}: {1}")]
    Io(TransplantStep, IOError),
    #[error("malformed {0} image: {1}")]
    Malformed(ImageRole, ImageReadError),
    #[error("allocation failed: {0}")]
    Allocation(TryReserveError),
}
