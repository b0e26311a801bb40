//! Error types for the ipcs-core library.
//!
//! Every fallible operation in the crate returns [`Result`]. Ordinary
//! "field not present in this output" outcomes are not errors; the scanner
//! reports them as `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ipcs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all ipcs-core operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Text could not be interpreted as hex
    #[error("invalid hex value '{value}': {details}")]
    InvalidFormat {
        /// The offending input
        value: String,
        /// What was wrong with it
        details: String,
    },

    /// An argument was outside the accepted domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A nibble, byte, word or bit position does not fit the magnitude
    #[error("index {index} out of range for {len} units")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of addressable units
        len: usize,
    },

    /// Division or remainder by a zero value
    #[error("division by zero")]
    DivisionByZero,

    /// Failed to read a file-backed source
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove an output file or directory
    #[error("failed to remove '{path}': {source}")]
    FileRemove {
        /// Path that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The output file of a subcommand was already deleted
    #[error("output file of subcommand '{subcmd}' was deleted")]
    OutputDeleted {
        /// The subcommand whose output is gone
        subcmd: String,
    },
}

impl Error {
    /// Creates a new invalid format error
    pub fn invalid_format(value: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidFormat {
            value: value.into(),
            details: details.into(),
        }
    }

    /// Creates a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new index out of range error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file remove error
    pub fn file_remove(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRemove {
            path: path.into(),
            source,
        }
    }

    /// Creates a new deleted output error
    pub fn output_deleted(subcmd: impl Into<String>) -> Self {
        Self::OutputDeleted {
            subcmd: subcmd.into(),
        }
    }

    /// Returns true if this error was caused by a missing file
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileRead { source, .. }
            | Self::FileWrite { source, .. }
            | Self::FileRemove { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_format("XYZ", "non-hex character 'X'");
        assert!(err.to_string().contains("XYZ"));
        assert!(err.to_string().contains("non-hex"));

        let err = Error::index_out_of_range(4, 2);
        assert_eq!(err.to_string(), "index 4 out of range for 2 units");
    }

    #[test]
    fn test_is_not_found() {
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(Error::file_read("/nope", missing).is_not_found());

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(!Error::file_read("/nope", denied).is_not_found());
        assert!(!Error::DivisionByZero.is_not_found());
    }
}
