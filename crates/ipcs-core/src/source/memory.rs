//! In-memory text source.

use super::search::{find_subsequence, rfind_subsequence};
use super::TextSource;
use crate::error::Result;
use std::ops::Range;

/// Subcommand output held in memory.
///
/// Content is stored as characters so that positions match a file-backed
/// source holding the same text, even when the text is not ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySource {
    chars: Vec<char>,
}

impl MemorySource {
    /// Creates a source over `text`
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            chars: text.as_ref().chars().collect(),
        }
    }

    /// Returns the full content as a string
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

impl From<&str> for MemorySource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for MemorySource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl TextSource for MemorySource {
    fn len(&self) -> Result<usize> {
        Ok(self.chars.len())
    }

    fn read_span(&self, range: Range<usize>) -> Result<String> {
        Ok(self.chars[range].iter().collect())
    }

    fn find_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        let needle: Vec<char> = needle.chars().collect();
        let start = range.start;
        Ok(find_subsequence(&self.chars[range], &needle).map(|pos| start + pos))
    }

    fn rfind_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        let needle: Vec<char> = needle.chars().collect();
        let start = range.start;
        Ok(rfind_subsequence(&self.chars[range], &needle).map(|pos| start + pos))
    }
}
