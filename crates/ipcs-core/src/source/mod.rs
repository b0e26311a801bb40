//! Uniform read-only access to subcommand output.
//!
//! IPCS output can be held in memory or written to a file that may be
//! many megabytes long. [`TextSource`] hides the difference: both
//! [`MemorySource`] and [`FileSource`] answer `len`, `slice`, `find` and
//! `rfind` identically for the same content, so the field scanner never
//! needs to know which one it is reading.
//!
//! ## Index semantics
//!
//! Positions count characters. Indices passed to [`TextSource::slice`],
//! [`TextSource::find`] and [`TextSource::rfind`] follow sequence-slicing
//! rules: a negative index counts back from the end, and anything outside
//! the content is clamped rather than rejected.
//!
//! ## Extensibility
//!
//! A new backing only implements the four bounded primitives
//! (`len`, `read_span`, `find_in`, `rfind_in`); the index normalization
//! is shared.
//!
//! ```no_run
//! use ipcs_core::source::{FileSource, TextSource};
//!
//! let output = FileSource::new("/tmp/ipcs/status.txt");
//! if let Some(pos) = output.find("SYSTEM RELATED DATA", 0, None)? {
//!     println!("{}", output.slice(pos as isize, pos as isize + 40)?);
//! }
//! # Ok::<(), ipcs_core::Error>(())
//! ```

mod file;
mod memory;
mod search;

use crate::encoding::Encoding;
use crate::error::Result;
use std::fmt;
use std::ops::Range;

pub use file::FileSource;
pub use memory::MemorySource;

/// Default number of bytes read per step when scanning a file
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for file-backed sources
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Bytes read per step by bounded searches
    pub chunk_size: usize,
    /// Single-byte encoding of the file's bytes
    pub encoding: Encoding,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            encoding: Encoding::Latin1,
        }
    }
}

impl SourceConfig {
    /// Creates a new source config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of bytes read per search step (at least 1)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sets the encoding of the file's bytes
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A read-only character sequence of known length.
///
/// Implementors provide bounded primitives; callers use the provided
/// methods, which normalize indices first.
pub trait TextSource: fmt::Debug + Send + Sync {
    /// Total number of characters
    fn len(&self) -> Result<usize>;

    /// Characters in `range`, which lies within `0..=len`
    fn read_span(&self, range: Range<usize>) -> Result<String>;

    /// First occurrence of `needle` entirely inside `range`.
    ///
    /// `needle` is non-empty, `range` lies within `0..=len` and is at
    /// least as long as `needle`.
    fn find_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>>;

    /// Last occurrence of `needle` entirely inside `range`, under the same
    /// conditions as [`TextSource::find_in`]
    fn rfind_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>>;

    /// Returns true if the source holds no characters
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Characters in `[start, end)` after index normalization
    fn slice(&self, start: isize, end: isize) -> Result<String> {
        let len = self.len()?;
        self.read_span(slice_range(start, end, len))
    }

    /// Character at `index`; negative indices count from the end
    fn char_at(&self, index: isize) -> Result<Option<char>> {
        let len = self.len()?;
        let position = if index < 0 {
            match len.checked_sub(index.unsigned_abs()) {
                Some(position) => position,
                None => return Ok(None),
            }
        } else {
            index.unsigned_abs()
        };
        if position >= len {
            return Ok(None);
        }
        Ok(self.read_span(position..position + 1)?.chars().next())
    }

    /// Index of the first `needle` fully inside `[start, end)`.
    ///
    /// `end` of `None` means the end of the content.
    fn find(&self, needle: &str, start: isize, end: Option<isize>) -> Result<Option<usize>> {
        let len = self.len()?;
        let needle_len = needle.chars().count();
        let Some(window) = search_window(needle_len, start, end, len) else {
            return Ok(None);
        };
        if needle_len == 0 {
            return Ok(Some(window.start));
        }
        self.find_in(needle, window)
    }

    /// Index of the last `needle` fully inside `[start, end)`.
    ///
    /// `start` still bounds the low end of the window and `end` the high
    /// end; only the scan direction is reversed.
    fn rfind(&self, needle: &str, start: isize, end: Option<isize>) -> Result<Option<usize>> {
        let len = self.len()?;
        let needle_len = needle.chars().count();
        let Some(window) = search_window(needle_len, start, end, len) else {
            return Ok(None);
        };
        if needle_len == 0 {
            return Ok(Some(window.end));
        }
        self.rfind_in(needle, window)
    }
}

/// Resolves a possibly negative index against `len` without clamping
/// the upper side
fn resolve_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs()
    }
}

/// Normalizes slice bounds to a range within `0..=len`
pub(crate) fn slice_range(start: isize, end: isize, len: usize) -> Range<usize> {
    let start = resolve_index(start, len).min(len);
    let end = resolve_index(end, len).min(len);
    if start >= end {
        start..start
    } else {
        start..end
    }
}

/// Normalizes search bounds. `None` when no occurrence of a needle of
/// `needle_len` characters can fit.
pub(crate) fn search_window(
    needle_len: usize,
    start: isize,
    end: Option<isize>,
    len: usize,
) -> Option<Range<usize>> {
    let end = end.map_or(len, |end| resolve_index(end, len).min(len));
    // start is not clamped: a start past the end finds nothing, even ""
    let start = resolve_index(start, len);
    if start > end || end - start < needle_len {
        return None;
    }
    Some(start..end)
}
