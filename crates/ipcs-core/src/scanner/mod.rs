//! Labeled field extraction over subcommand output.
//!
//! IPCS reports are full of `LABEL<separator>VALUE` pairs. The scanner
//! locates a label in a [`TextSource`], checks that the separator follows
//! it literally, and returns the value that comes after. The value is
//! delimited either by an end marker ([`get_field`], [`rget_field`]) or by
//! a fixed length ([`get_field2`], [`rget_field2`]).
//!
//! ## Algorithm Overview
//!
//! 1. Search for the label inside the query window, first occurrence for
//!    the forward variants and last occurrence for the `r` variants
//! 2. Require the separator immediately after the label
//! 3. Take the value span, ending at the first end marker inside the
//!    window or after a fixed number of characters
//! 4. Optionally parse the span as a [`HexValue`]
//!
//! A label, separator or end marker that cannot be found is an ordinary
//! outcome and yields `Ok(None)`; only I/O failures and bad hex are errors.
//!
//! ```
//! use ipcs_core::scanner::{get_field, get_field2, FieldQuery};
//! use ipcs_core::source::MemorySource;
//!
//! let output = MemorySource::new("HEX FIELD = FFF, STRING: ABCXYZ");
//!
//! let query = FieldQuery::new("HEX FIELD").separator(" = ").to_hex(true);
//! let field = get_field(&output, &query, ",")?.unwrap();
//! assert_eq!(field.hex().unwrap().to_str(), "FFF");
//!
//! let query = FieldQuery::new("STRING").separator(": ");
//! let field = get_field2(&output, &query, 6)?.unwrap();
//! assert_eq!(field.text(), Some("ABCXYZ"));
//! # Ok::<(), ipcs_core::Error>(())
//! ```

use crate::error::Result;
use crate::hex::HexValue;
use crate::source::TextSource;
use std::fmt;
use std::ops::Range;
use tracing::trace;

/// Where and how to look for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    /// Text preceding the value
    pub label: String,
    /// Text that must sit between the label and the value
    pub separator: String,
    /// Low bound of the search window; negative counts from the end
    pub start: isize,
    /// High bound of the search window; `None` is the end of the output
    pub end: Option<isize>,
    /// Parse the value as hex instead of returning the raw text
    pub to_hex: bool,
}

impl FieldQuery {
    /// Creates a query for `label` over the whole output
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            separator: String::new(),
            start: 0,
            end: None,
            to_hex: false,
        }
    }

    /// Sets the separator between label and value
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the low bound of the search window
    pub fn start(mut self, start: isize) -> Self {
        self.start = start;
        self
    }

    /// Sets the high bound of the search window
    pub fn end(mut self, end: isize) -> Self {
        self.end = Some(end);
        self
    }

    /// Sets whether the value is parsed as hex
    pub fn to_hex(mut self, to_hex: bool) -> Self {
        self.to_hex = to_hex;
        self
    }
}

/// An extracted value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Raw text as it appears in the output
    Text(String),
    /// Text parsed as hex after trimming surrounding whitespace
    Hex(HexValue),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Hex(hex) => write!(f, "{}", hex),
        }
    }
}

/// A field found in a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The extracted value
    pub value: FieldValue,
    /// Character range of the raw value in the source
    pub range: Range<usize>,
}

impl Field {
    /// Creates a new field
    pub fn new(value: FieldValue, range: Range<usize>) -> Self {
        Self { value, range }
    }

    /// Offset of the first character of the value
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Offset just past the last character of the value
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// The value as text, if it was not parsed as hex
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(text) => Some(text),
            FieldValue::Hex(_) => None,
        }
    }

    /// The value as hex, if it was parsed as hex
    pub fn hex(&self) -> Option<&HexValue> {
        match &self.value {
            FieldValue::Hex(hex) => Some(hex),
            FieldValue::Text(_) => None,
        }
    }
}

/// Flattens a scan result into `(value, start, end)`, with
/// `(None, -1, -1)` for a missing field
pub fn as_triple(field: Option<&Field>) -> (Option<&FieldValue>, isize, isize) {
    match field {
        Some(field) => (
            Some(&field.value),
            field.start() as isize,
            field.end() as isize,
        ),
        None => (None, -1, -1),
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Reverse,
}

/// Finds the label and checks the separator, returning where the value
/// starts
fn value_start<S>(source: &S, query: &FieldQuery, direction: Direction) -> Result<Option<usize>>
where
    S: TextSource + ?Sized,
{
    let found = match direction {
        Direction::Forward => source.find(&query.label, query.start, query.end)?,
        Direction::Reverse => source.rfind(&query.label, query.start, query.end)?,
    };
    let Some(label_start) = found else {
        trace!("Label '{}' not found", query.label);
        return Ok(None);
    };

    let separator_start = label_start + query.label.chars().count();
    if query.separator.is_empty() {
        return Ok(Some(separator_start));
    }

    let separator_end = separator_start + query.separator.chars().count();
    let actual = source.slice(separator_start as isize, separator_end as isize)?;
    if actual != query.separator {
        trace!(
            "Label '{}' at {} not followed by separator '{}'",
            query.label,
            label_start,
            query.separator
        );
        return Ok(None);
    }
    Ok(Some(separator_end))
}

fn end_marker_field<S>(
    source: &S,
    query: &FieldQuery,
    end_string: &str,
    direction: Direction,
) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    let Some(start) = value_start(source, query, direction)? else {
        return Ok(None);
    };
    let Some(end) = source.find(end_string, start as isize, query.end)? else {
        trace!("End marker '{}' not found after {}", end_string, start);
        return Ok(None);
    };
    build_field(source, query, start..end).map(Some)
}

fn fixed_length_field<S>(
    source: &S,
    query: &FieldQuery,
    length: usize,
    direction: Direction,
) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    let Some(start) = value_start(source, query, direction)? else {
        return Ok(None);
    };
    let len = source.len()?;
    let start = start.min(len);
    let end = start.saturating_add(length).min(len);
    build_field(source, query, start..end).map(Some)
}

fn build_field<S>(source: &S, query: &FieldQuery, range: Range<usize>) -> Result<Field>
where
    S: TextSource + ?Sized,
{
    let raw = source.slice(range.start as isize, range.end as isize)?;
    trace!("Field '{}' at {:?}: '{}'", query.label, range, raw);

    let value = if query.to_hex {
        FieldValue::Hex(HexValue::new(raw.trim())?)
    } else {
        FieldValue::Text(raw)
    };
    Ok(Field::new(value, range))
}

/// Extracts the value after the first `label` in the window, ending at
/// the next `end_string`
pub fn get_field<S>(source: &S, query: &FieldQuery, end_string: &str) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    end_marker_field(source, query, end_string, Direction::Forward)
}

/// Extracts `length` characters after the first `label` in the window
pub fn get_field2<S>(source: &S, query: &FieldQuery, length: usize) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    fixed_length_field(source, query, length, Direction::Forward)
}

/// Like [`get_field`], but uses the last `label` in the window
pub fn rget_field<S>(source: &S, query: &FieldQuery, end_string: &str) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    end_marker_field(source, query, end_string, Direction::Reverse)
}

/// Like [`get_field2`], but uses the last `label` in the window
pub fn rget_field2<S>(source: &S, query: &FieldQuery, length: usize) -> Result<Option<Field>>
where
    S: TextSource + ?Sized,
{
    fixed_length_field(source, query, length, Direction::Reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;

    const REPORT: &str = "STRING : ABC HEX(ABC)\n STRING : DEF \n STRING : GHI \n";

    fn report() -> MemorySource {
        MemorySource::new(REPORT)
    }

    fn text_of(field: Option<Field>) -> (String, Range<usize>) {
        let field = field.unwrap();
        (field.text().unwrap().to_string(), field.range)
    }

    #[test]
    fn test_get_field() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ");
        assert_eq!(
            text_of(get_field(&source, &query, " ").unwrap()),
            ("ABC".to_string(), 9..12)
        );
    }

    #[test]
    fn test_get_field_to_hex() {
        let source = report();
        let query = FieldQuery::new("HEX").separator("(").to_hex(true);
        let field = get_field(&source, &query, ")").unwrap().unwrap();

        assert_eq!(field.hex().unwrap().to_str(), "ABC");
        assert_eq!(field.range, 17..20);
        assert_eq!(source.slice(17, 20).unwrap(), "ABC");
    }

    #[test]
    fn test_get_field_window() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ").start(30);
        assert_eq!(
            text_of(get_field(&source, &query, " ").unwrap()),
            ("GHI".to_string(), 47..50)
        );

        let query = FieldQuery::new("STRING").separator(" : ").start(1).end(40);
        assert_eq!(
            text_of(get_field(&source, &query, " ").unwrap()),
            ("DEF".to_string(), 32..35)
        );
    }

    #[test]
    fn test_rget_field() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ");
        assert_eq!(
            text_of(rget_field(&source, &query, " ").unwrap()),
            ("GHI".to_string(), 47..50)
        );

        let query = FieldQuery::new("STRING").separator(" : ").end(20);
        assert_eq!(
            text_of(rget_field(&source, &query, " ").unwrap()),
            ("ABC".to_string(), 9..12)
        );
    }

    #[test]
    fn test_get_field2() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ");
        assert_eq!(
            text_of(get_field2(&source, &query, 3).unwrap()),
            ("ABC".to_string(), 9..12)
        );

        let query = FieldQuery::new("HEX").separator("(").to_hex(true);
        let field = get_field2(&source, &query, 3).unwrap().unwrap();
        assert_eq!(field.hex().unwrap().to_str(), "ABC");
        assert_eq!(field.range, 17..20);
    }

    #[test]
    fn test_rget_field2() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ");
        assert_eq!(
            text_of(rget_field2(&source, &query, 3).unwrap()),
            ("GHI".to_string(), 47..50)
        );

        let query = FieldQuery::new("STRING").separator(" : ").end(-20);
        assert_eq!(
            text_of(rget_field2(&source, &query, 3).unwrap()),
            ("DEF".to_string(), 32..35)
        );
    }

    #[test]
    fn test_labeled_fields() {
        let source = MemorySource::new("HEX FIELD = FFF, STRING: ABCXYZ");

        let query = FieldQuery::new("HEX FIELD").separator(" = ").to_hex(true);
        let field = get_field(&source, &query, ",").unwrap().unwrap();
        assert_eq!(field.hex(), Some(&HexValue::new("FFF").unwrap()));
        assert_eq!(field.range, 12..15);

        let query = FieldQuery::new("STRING").separator(": ");
        let field = get_field2(&source, &query, 6).unwrap().unwrap();
        assert_eq!(field.text(), Some("ABCXYZ"));
        assert_eq!(field.range, 25..31);
    }

    #[test]
    fn test_missing_label() {
        let source = report();
        let query = FieldQuery::new("NOPE");
        let field = get_field(&source, &query, ",").unwrap();

        assert!(field.is_none());
        assert!(rget_field(&source, &query, ",").unwrap().is_none());
        assert!(get_field2(&source, &query, 3).unwrap().is_none());
        assert!(rget_field2(&source, &query, 3).unwrap().is_none());
        assert_eq!(as_triple(field.as_ref()), (None, -1, -1));
    }

    #[test]
    fn test_separator_must_match() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" = ");
        assert!(get_field(&source, &query, " ").unwrap().is_none());
        assert!(get_field2(&source, &query, 3).unwrap().is_none());
    }

    #[test]
    fn test_missing_end_marker() {
        let source = report();
        let query = FieldQuery::new("HEX").separator("(");
        assert!(get_field(&source, &query, "]").unwrap().is_none());

        // the marker exists, but only past the window
        let query = FieldQuery::new("HEX").separator("(").end(19);
        assert!(get_field(&source, &query, ")").unwrap().is_none());
    }

    #[test]
    fn test_fixed_length_clamped_to_source() {
        let source = MemorySource::new("RC=0004");
        let query = FieldQuery::new("RC").separator("=");
        assert_eq!(
            text_of(get_field2(&source, &query, 100).unwrap()),
            ("0004".to_string(), 3..7)
        );
    }

    #[test]
    fn test_to_hex_trims_and_rejects() {
        let source = MemorySource::new("ADDR: 00FC1000 , NAME: SYSTEM ,");
        let query = FieldQuery::new("ADDR").separator(":").to_hex(true);
        let field = get_field(&source, &query, ",").unwrap().unwrap();
        assert_eq!(field.hex().unwrap().to_str(), "00FC1000");
        assert_eq!(field.range, 5..15);

        let query = FieldQuery::new("NAME").separator(":").to_hex(true);
        let err = get_field(&source, &query, ",").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_as_triple() {
        let source = report();
        let query = FieldQuery::new("STRING").separator(" : ");
        let field = get_field(&source, &query, " ").unwrap();
        let (value, start, end) = as_triple(field.as_ref());

        assert_eq!(value.map(ToString::to_string), Some("ABC".to_string()));
        assert_eq!((start, end), (9, 12));
    }

    #[test]
    fn test_trait_object_source() {
        let source: Box<dyn TextSource> = Box::new(report());
        let query = FieldQuery::new("STRING").separator(" : ");
        assert_eq!(
            text_of(rget_field(source.as_ref(), &query, " ").unwrap()),
            ("GHI".to_string(), 47..50)
        );
    }
}
