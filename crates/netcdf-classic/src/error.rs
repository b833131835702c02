//! Error types for NetCDF classic parsing operations.

use thiserror::Error;

/// Result type for NetCDF reader operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing and data access.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// Malformed magic/version or unknown element type code
    #[error("Invalid format: {0}")]
    Format(String),

    /// Invalid identifier or no grammar alternative matched
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// A header padding byte was not zero
    #[error("Non-zero padding byte {byte:#04x} at offset {offset}")]
    Padding { offset: u64, byte: u8 },

    /// Requested dimension, variable or index could not be resolved
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Rejected reader configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Underlying byte source error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`NetCdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Grammar,
    Padding,
    Lookup,
    Config,
    Io,
}

impl NetCdfError {
    /// Create a Format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a Grammar error.
    pub fn grammar(msg: impl Into<String>) -> Self {
        Self::Grammar(msg.into())
    }

    /// Create a Lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// The failure class, for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Grammar(_) => ErrorKind::Grammar,
            Self::Padding { .. } => ErrorKind::Padding,
            Self::Lookup(_) => ErrorKind::Lookup,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}
