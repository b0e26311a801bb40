//! # ipcs-core
//!
//! Building blocks for reading z/OS IPCS dump analysis output.
//!
//! This crate provides the core functionality for:
//! - Working with signed, arbitrary-width hex values as they appear in dumps
//! - Reading subcommand output uniformly, whether held in memory or in a file
//! - Extracting labeled fields from that output
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`hex`]: The [`HexValue`] type with arithmetic and bit addressing
//! - [`source`]: The [`TextSource`] trait and its memory and file backings
//! - [`scanner`]: Forward and reverse labeled-field extraction
//! - [`output`]: Subcommand output storage and cleanup
//! - [`psw`]: Program Status Word decoding
//! - [`encoding`]: Single-byte code pages for decoding payloads
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use ipcs_core::{get_field, rget_field, FieldQuery, MemorySource};
//!
//! let output = MemorySource::new("ASID(X'0001') ... ASID(X'001F')");
//! let query = FieldQuery::new("ASID").separator("(X'").to_hex(true);
//!
//! let first = get_field(&output, &query, "'")?.unwrap();
//! let last = rget_field(&output, &query, "'")?.unwrap();
//! assert_eq!(first.hex().unwrap().to_str(), "0001");
//! assert_eq!(last.hex().unwrap().to_str(), "001F");
//! # Ok::<(), ipcs_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`TextSource`]: Add a new backing for subcommand output; the field
//!   extractors work with any implementation
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod encoding;
pub mod error;
pub mod hex;
pub mod output;
pub mod psw;
pub mod scanner;
pub mod source;

// Re-export primary types for convenience
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use hex::HexValue;
pub use output::SubcmdOutput;
pub use psw::{psw_parse, psw_scrunch, AscMode, PswInfo};
pub use scanner::{
    as_triple, get_field, get_field2, rget_field, rget_field2, Field, FieldQuery, FieldValue,
};
pub use source::{FileSource, MemorySource, SourceConfig, TextSource};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
