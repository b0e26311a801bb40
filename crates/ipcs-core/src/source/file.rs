//! File-backed text source.
//!
//! Every operation opens the file, reads only the span it needs and
//! closes it again before returning. Nothing is cached, so a file removed
//! between two calls makes the second call fail with a not-found error.

use super::search::{find_subsequence, rfind_subsequence};
use super::{SourceConfig, TextSource};
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Subcommand output stored in a file whose bytes are its characters
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    config: SourceConfig,
}

impl FileSource {
    /// Creates a source over the file at `path` with default configuration.
    ///
    /// The file is not touched until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: SourceConfig::default(),
        }
    }

    /// Creates a source with custom configuration.
    ///
    /// Fails with `InvalidArgument` if the encoding is not single-byte,
    /// since positions must be byte offsets.
    pub fn with_config(path: impl Into<PathBuf>, config: SourceConfig) -> Result<Self> {
        if !config.encoding.is_single_byte() {
            return Err(Error::invalid_argument(format!(
                "file sources need a single-byte encoding, got '{}'",
                config.encoding
            )));
        }
        Ok(Self {
            path: path.into(),
            config,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration in use
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| Error::file_read(&self.path, e))
    }

    /// Reads up to `len` bytes starting at `offset`
    fn read_at(&self, file: &mut File, offset: usize, len: usize) -> Result<Vec<u8>> {
        trace!(
            "Reading {}..{} from {}",
            offset,
            offset + len,
            self.path.display()
        );
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|e| Error::file_read(&self.path, e))?;

        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| Error::file_read(&self.path, e))?;
        Ok(buffer)
    }

    /// Needle bytes, or `None` if the needle cannot occur in this encoding
    fn encode_needle(&self, needle: &str) -> Option<Vec<u8>> {
        self.config.encoding.encode(needle)
    }

    /// Bytes per search step; always room for at least one needle
    fn step(&self, needle_len: usize) -> usize {
        self.config.chunk_size.max(needle_len)
    }
}

impl TextSource for FileSource {
    fn len(&self) -> Result<usize> {
        let metadata = fs::metadata(&self.path).map_err(|e| Error::file_read(&self.path, e))?;
        Ok(metadata.len() as usize)
    }

    fn read_span(&self, range: Range<usize>) -> Result<String> {
        if range.is_empty() {
            return Ok(String::new());
        }
        let mut file = self.open()?;
        let bytes = self.read_at(&mut file, range.start, range.len())?;
        Ok(self.config.encoding.decode(&bytes))
    }

    fn find_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        let Some(needle) = self.encode_needle(needle) else {
            return Ok(None);
        };
        let step = self.step(needle.len());
        let mut file = self.open()?;

        let mut lo = range.start;
        loop {
            let hi = lo.saturating_add(step).min(range.end);
            let chunk = self.read_at(&mut file, lo, hi - lo)?;
            if let Some(pos) = find_subsequence(&chunk, &needle) {
                return Ok(Some(lo + pos));
            }
            // a short read means the file ended early
            if hi == range.end || chunk.len() < hi - lo {
                return Ok(None);
            }
            // overlap so a needle straddling the boundary is still seen
            lo = hi + 1 - needle.len();
        }
    }

    fn rfind_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        let Some(needle) = self.encode_needle(needle) else {
            return Ok(None);
        };
        let step = self.step(needle.len());
        let mut file = self.open()?;

        let mut hi = range.end;
        loop {
            let lo = hi.saturating_sub(step).max(range.start);
            let chunk = self.read_at(&mut file, lo, hi - lo)?;
            if let Some(pos) = rfind_subsequence(&chunk, &needle) {
                return Ok(Some(lo + pos));
            }
            if lo == range.start {
                return Ok(None);
            }
            hi = lo + needle.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_with(content: &[u8], config: SourceConfig) -> (NamedTempFile, FileSource) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        let source = FileSource::with_config(file.path(), config).unwrap();
        (file, source)
    }

    fn source(content: &str) -> (NamedTempFile, FileSource) {
        source_with(content.as_bytes(), SourceConfig::default())
    }

    #[test]
    fn test_indexing() {
        let (_file, source) = source("FILE OUTPUT");
        assert_eq!(source.len().unwrap(), 11);
        assert_eq!(source.char_at(1).unwrap(), Some('I'));
        assert_eq!(source.char_at(-1).unwrap(), Some('T'));
        assert_eq!(source.slice(2, 4).unwrap(), "LE");
        assert_eq!(source.slice(-6, 1000).unwrap(), "OUTPUT");
    }

    #[test]
    fn test_find() {
        let (_file, source) = source("FILE FILE FILE");
        assert_eq!(source.find("FILE", 0, None).unwrap(), Some(0));
        assert_eq!(source.find("F", 0, None).unwrap(), Some(0));
        assert_eq!(source.find("FILE1", 0, None).unwrap(), None);
        assert_eq!(source.find("FILE", 6, None).unwrap(), Some(10));
        assert_eq!(source.find("FILE", 1, Some(9)).unwrap(), Some(5));
    }

    #[test]
    fn test_rfind() {
        let (_file, source) = source("FILE FILE FILE");
        assert_eq!(source.rfind("FILE", 0, None).unwrap(), Some(10));
        assert_eq!(source.rfind("F", 0, None).unwrap(), Some(10));
        assert_eq!(source.rfind("FILE1", 0, None).unwrap(), None);
        assert_eq!(source.rfind("FILE", 0, Some(6)).unwrap(), Some(0));
        assert_eq!(source.rfind("FILE", 1, Some(9)).unwrap(), Some(5));
    }

    #[test]
    fn test_small_chunks_cross_boundaries() {
        let text = "....ABCDEF....ABCDEF..";
        let config = SourceConfig::new().chunk_size(3);
        let (_file, source) = source_with(text.as_bytes(), config);

        assert_eq!(source.find("ABCDEF", 0, None).unwrap(), Some(4));
        assert_eq!(source.find("ABCDEF", 5, None).unwrap(), Some(14));
        assert_eq!(source.rfind("ABCDEF", 0, None).unwrap(), Some(14));
        assert_eq!(source.rfind("ABCDEF", 0, Some(19)).unwrap(), Some(4));
        assert_eq!(source.find("ABCDEF", 5, Some(19)).unwrap(), None);
    }

    #[test]
    fn test_ibm1047_file() {
        // "HEX(C1)" in EBCDIC
        let bytes = Encoding::Ibm1047.encode("HEX(C1)").unwrap();
        let config = SourceConfig::new().encoding(Encoding::Ibm1047);
        let (_file, source) = source_with(&bytes, config);

        assert_eq!(source.find("(", 0, None).unwrap(), Some(3));
        assert_eq!(source.slice(4, 6).unwrap(), "C1");
    }

    #[test]
    fn test_latin1_needle_outside_encoding() {
        let (_file, source) = source("PRICE 5");
        assert_eq!(source.find("\u{20ac}", 0, None).unwrap(), None);
    }

    #[test]
    fn test_rejects_multibyte_encoding() {
        let config = SourceConfig::new().encoding(Encoding::Utf8);
        assert!(matches!(
            FileSource::with_config("/tmp/x", config),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deleted_between_operations() {
        let (file, source) = source("STILL HERE");
        assert_eq!(source.find("HERE", 0, None).unwrap(), Some(6));

        file.close().unwrap();
        let err = source.find("HERE", 0, None).unwrap_err();
        assert!(err.is_not_found());
        assert!(source.slice(0, 5).unwrap_err().is_not_found());
    }
}
