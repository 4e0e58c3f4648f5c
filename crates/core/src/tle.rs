//! Two-line element sets as stored on disk and returned by the catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::TLE_LINE_LEN;

/// Reasons a pair of lines is not a usable element set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TleFormatError {
    #[error("expected 2 lines, found {0}")]
    LineCount(usize),
    #[error("line {line} contains non-ASCII characters")]
    NonAscii { line: u8 },
    #[error("line {line} is {len} columns long, expected 69")]
    LineLength { line: u8, len: usize },
    #[error("line {line} does not start with `{line} `")]
    LineNumber { line: u8 },
    #[error("catalog numbers differ between lines ({first} vs {second})")]
    CatalogMismatch { first: String, second: String },
}

/// A validated TLE pair. Construction fails unless both lines are well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTle")]
pub struct TwoLineElement {
    line1: String,
    line2: String,
}

#[derive(Deserialize)]
struct RawTle {
    line1: String,
    line2: String,
}

impl TryFrom<RawTle> for TwoLineElement {
    type Error = TleFormatError;

    fn try_from(raw: RawTle) -> Result<Self, Self::Error> {
        Self::new(raw.line1, raw.line2)
    }
}

impl TwoLineElement {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Result<Self, TleFormatError> {
        let line1 = line1.into();
        let line2 = line2.into();
        check_line(&line1, 1)?;
        check_line(&line2, 2)?;
        let first = catalog_field(&line1);
        let second = catalog_field(&line2);
        if first != second {
            return Err(TleFormatError::CatalogMismatch {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        Ok(Self { line1, line2 })
    }

    /// Parse the on-disk record: exactly two lines, trailing newline optional.
    pub fn from_record(text: &str) -> Result<Self, TleFormatError> {
        let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        match lines.as_slice() {
            [line1, line2] => Self::new(*line1, *line2),
            other => Err(TleFormatError::LineCount(other.len())),
        }
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    /// NORAD catalog number from columns 3-7.
    pub fn catalog_number(&self) -> &str {
        catalog_field(&self.line1)
    }

    /// Record text as written by the store.
    pub fn to_record(&self) -> String {
        format!("{}\n{}\n", self.line1, self.line2)
    }
}

fn check_line(line: &str, number: u8) -> Result<(), TleFormatError> {
    if !line.is_ascii() {
        return Err(TleFormatError::NonAscii { line: number });
    }
    if line.len() != TLE_LINE_LEN {
        return Err(TleFormatError::LineLength {
            line: number,
            len: line.len(),
        });
    }
    let prefix = [b'0' + number, b' '];
    if !line.as_bytes().starts_with(&prefix) {
        return Err(TleFormatError::LineNumber { line: number });
    }
    Ok(())
}

fn catalog_field(line: &str) -> &str {
    line.get(2..7).map(str::trim).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "1 33591U 09005A   22020.44937208  .00000081  00000-0  68837-4 0  9993";
    const LINE2: &str = "2 33591  99.1663  51.3451 0013122 241.8520 118.1325 14.12523655667551";

    #[test]
    fn parses_record_with_trailing_newline() {
        let tle = TwoLineElement::from_record(&format!("{LINE1}\r\n{LINE2}\n\n")).unwrap();
        assert_eq!(tle.line1(), LINE1);
        assert_eq!(tle.catalog_number(), "33591");
        assert_eq!(TwoLineElement::from_record(&tle.to_record()).unwrap(), tle);
    }

    #[test]
    fn rejects_wrong_line_count() {
        assert_eq!(
            TwoLineElement::from_record(LINE1),
            Err(TleFormatError::LineCount(1))
        );
        let three = format!("NOAA 19\n{LINE1}\n{LINE2}");
        assert_eq!(
            TwoLineElement::from_record(&three),
            Err(TleFormatError::LineCount(3))
        );
    }

    #[test]
    fn rejects_truncated_line() {
        let err = TwoLineElement::new(&LINE1[..60], LINE2).unwrap_err();
        assert_eq!(err, TleFormatError::LineLength { line: 1, len: 60 });
    }

    #[test]
    fn rejects_swapped_lines() {
        assert_eq!(
            TwoLineElement::new(LINE2, LINE1),
            Err(TleFormatError::LineNumber { line: 1 })
        );
    }

    #[test]
    fn rejects_mismatched_catalog_numbers() {
        let other = LINE2.replacen("33591", "25544", 1);
        assert!(matches!(
            TwoLineElement::new(LINE1, other),
            Err(TleFormatError::CatalogMismatch { .. })
        ));
    }
}
