//! Storage and lifetime of a subcommand's output.
//!
//! A [`SubcmdOutput`] pairs an IPCS subcommand and its return code with
//! the text it produced, held either in memory or in a file. File output
//! is written under a caller-chosen directory and, unless the caller asks
//! to keep it, removed again when the value is dropped.
//!
//! `SubcmdOutput` is itself a [`TextSource`], so the field extractors in
//! [`crate::scanner`] work on it directly.

use crate::error::{Error, Result};
use crate::source::{FileSource, MemorySource, SourceConfig, TextSource};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Characters dropped from a subcommand when it becomes a file name
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\0', '?', '*', ':', ' ', '\''];

/// Extension of output files
const OUTFILE_EXTENSION: &str = "txt";

#[derive(Debug)]
enum Backing {
    Memory(MemorySource),
    File(FileSource),
    Deleted,
}

/// Output of one IPCS subcommand
#[derive(Debug)]
pub struct SubcmdOutput {
    subcmd: String,
    rc: i32,
    backing: Backing,
    keep_file: bool,
    cleanup_root: Option<PathBuf>,
}

fn normalize_subcmd(subcmd: &str) -> String {
    subcmd.trim().to_uppercase()
}

/// Returns the first free output file path for `subcmd` in `dir`.
///
/// The name is the lower-cased subcommand without characters that are
/// awkward in file names. Taken names get a `(1)`, `(2)`, ... suffix.
pub fn outfile_path(dir: impl AsRef<Path>, subcmd: &str) -> PathBuf {
    let dir = dir.as_ref();
    let stem: String = subcmd
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c))
        .collect();

    let mut path = dir.join(format!("{}.{}", stem, OUTFILE_EXTENSION));
    let mut copy = 1;
    while path.exists() {
        path = dir.join(format!("{}({}).{}", stem, copy, OUTFILE_EXTENSION));
        copy += 1;
    }
    path
}

impl SubcmdOutput {
    /// Wraps output held in memory
    pub fn from_text(subcmd: &str, rc: i32, text: impl Into<String>) -> Self {
        Self {
            subcmd: normalize_subcmd(subcmd),
            rc,
            backing: Backing::Memory(MemorySource::new(text.into())),
            keep_file: false,
            cleanup_root: None,
        }
    }

    /// Wraps output already stored in a file.
    ///
    /// The file belongs to the caller, so `keep_file` starts out true.
    pub fn from_file(subcmd: &str, rc: i32, path: impl Into<PathBuf>) -> Self {
        Self {
            subcmd: normalize_subcmd(subcmd),
            rc,
            backing: Backing::File(FileSource::new(path)),
            keep_file: true,
            cleanup_root: None,
        }
    }

    /// Like [`SubcmdOutput::from_file`] with a custom source configuration
    pub fn from_file_with_config(
        subcmd: &str,
        rc: i32,
        path: impl Into<PathBuf>,
        config: SourceConfig,
    ) -> Result<Self> {
        Ok(Self {
            subcmd: normalize_subcmd(subcmd),
            rc,
            backing: Backing::File(FileSource::with_config(path, config)?),
            keep_file: true,
            cleanup_root: None,
        })
    }

    /// Writes `text` to a new file in `dir` and wraps it.
    ///
    /// `dir` is created if needed and becomes the cleanup root, so
    /// deleting the file also removes `dir` once it is empty. The file is
    /// deleted on drop unless [`SubcmdOutput::set_keep_file`] is called.
    pub fn write_file(
        dir: impl AsRef<Path>,
        subcmd: &str,
        rc: i32,
        text: &str,
        config: SourceConfig,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let subcmd = normalize_subcmd(subcmd);

        let bytes = config.encoding.encode(text).ok_or_else(|| {
            Error::invalid_argument(format!(
                "output of '{}' cannot be encoded as {}",
                subcmd, config.encoding
            ))
        })?;

        fs::create_dir_all(dir).map_err(|e| Error::file_write(dir, e))?;
        let path = outfile_path(dir, &subcmd);
        let source = FileSource::with_config(&path, config)?;
        fs::write(&path, &bytes).map_err(|e| Error::file_write(&path, e))?;
        debug!(
            "Wrote {} bytes of '{}' output to {}",
            bytes.len(),
            subcmd,
            path.display()
        );

        Ok(Self {
            subcmd,
            rc,
            backing: Backing::File(source),
            keep_file: false,
            cleanup_root: Some(dir.to_path_buf()),
        })
    }

    /// Sets the highest directory that [`SubcmdOutput::delete_file`] may
    /// remove once it is empty
    pub fn with_cleanup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cleanup_root = Some(root.into());
        self
    }

    /// Upper-cased subcommand
    pub fn subcmd(&self) -> &str {
        &self.subcmd
    }

    /// Return code of the subcommand
    pub fn rc(&self) -> i32 {
        self.rc
    }

    /// Path of the output file, if the output lives in a file that has
    /// not been deleted
    pub fn outfile(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(source) => Some(source.path()),
            _ => None,
        }
    }

    /// The output text, if it is held in memory
    pub fn output(&self) -> Option<String> {
        match &self.backing {
            Backing::Memory(source) => Some(source.text()),
            _ => None,
        }
    }

    /// Whether the output file survives this value
    pub fn keep_file(&self) -> bool {
        self.keep_file
    }

    /// Sets whether the output file survives this value
    pub fn set_keep_file(&mut self, keep_file: bool) {
        self.keep_file = keep_file;
    }

    /// The backing source
    pub fn source(&self) -> Result<&dyn TextSource> {
        match &self.backing {
            Backing::Memory(source) => Ok(source),
            Backing::File(source) => Ok(source),
            Backing::Deleted => Err(Error::output_deleted(&self.subcmd)),
        }
    }

    /// Deletes the output file, then any parent directories left empty up
    /// to the cleanup root.
    ///
    /// Calling this on in-memory or already deleted output only logs a
    /// warning.
    pub fn delete_file(&mut self) -> Result<()> {
        let path = match &self.backing {
            Backing::File(source) => source.path().to_path_buf(),
            _ => {
                warn!(
                    "Output file of '{}' was already deleted or never existed",
                    self.subcmd
                );
                return Ok(());
            }
        };

        if path.is_file() {
            fs::remove_file(&path).map_err(|e| Error::file_remove(&path, e))?;
            debug!("Deleted output file {}", path.display());
        }
        self.backing = Backing::Deleted;

        if let Some(root) = &self.cleanup_root {
            prune_empty_dirs(&path, root)?;
        }
        Ok(())
    }
}

/// Removes empty ancestors of `path`, stopping after `root` or at the
/// first directory that still has entries
fn prune_empty_dirs(path: &Path, root: &Path) -> Result<()> {
    let mut dir = path.parent();
    while let Some(current) = dir {
        if !current.starts_with(root) || !current.is_dir() {
            break;
        }
        let is_empty = fs::read_dir(current)
            .map_err(|e| Error::file_remove(current, e))?
            .next()
            .is_none();
        if !is_empty {
            break;
        }
        fs::remove_dir(current).map_err(|e| Error::file_remove(current, e))?;
        debug!("Removed empty directory {}", current.display());

        if current == root {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

impl Drop for SubcmdOutput {
    fn drop(&mut self) {
        if self.keep_file || !matches!(self.backing, Backing::File(_)) {
            return;
        }
        if let Err(e) = self.delete_file() {
            warn!("Failed to clean up output of '{}': {}", self.subcmd, e);
        }
    }
}

impl TextSource for SubcmdOutput {
    fn len(&self) -> Result<usize> {
        self.source()?.len()
    }

    fn read_span(&self, range: Range<usize>) -> Result<String> {
        self.source()?.read_span(range)
    }

    fn find_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        self.source()?.find_in(needle, range)
    }

    fn rfind_in(&self, needle: &str, range: Range<usize>) -> Result<Option<usize>> {
        self.source()?.rfind_in(needle, range)
    }
}
