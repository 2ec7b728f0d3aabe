//! Error types for conversion and export operations
//!
//! The transducer itself never fails: malformed markup and missing attributes
//! degrade to best-effort output. Errors only arise at the byte boundary
//! (decoding input) and at the file system boundary (export).

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while turning input bytes into text for conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Input is not valid in the detected charset, or the charset is unsupported
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ConversionError {
    /// Get numeric error code
    pub fn code(&self) -> u32 {
        match self {
            ConversionError::EncodingError(_) => 2,
        }
    }
}

/// Fatal errors for a single document during export
///
/// Missing assets and already-existing directories are not errors; they are
/// handled inside the exporter.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Input file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// Input file could not be decoded
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: ConversionError,
    },
    /// Markdown output could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    /// Output or asset directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    /// A referenced asset exists but could not be copied
    #[error("failed to copy asset {}: {source}", path.display())]
    CopyAsset { path: PathBuf, source: io::Error },
    /// A source directory could not be listed
    #[error("failed to list directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },
}

impl ExportError {
    /// Path the failed operation was working on
    pub fn path(&self) -> &Path {
        match self {
            ExportError::Read { path, .. }
            | ExportError::Decode { path, .. }
            | ExportError::Write { path, .. }
            | ExportError::CreateDir { path, .. }
            | ExportError::CopyAsset { path, .. }
            | ExportError::ReadDir { path, .. } => path,
        }
    }

    /// Get numeric error code
    pub fn code(&self) -> u32 {
        match self {
            ExportError::Read { .. } => 10,
            ExportError::Decode { source, .. } => source.code(),
            ExportError::Write { .. } => 11,
            ExportError::CreateDir { .. } => 12,
            ExportError::CopyAsset { .. } => 13,
            ExportError::ReadDir { .. } => 14,
        }
    }
}
