//! Conversion between spreadsheet column labels (`A`, `Z`, `AA`, ...) and
//! zero-based column indices.
//!
//! Labels are bijective base-26 numerals: the digits run `A=1` through `Z=26`
//! and there is no zero digit, so `Z` is followed by `AA` rather than `BA`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, ToolError};

const RADIX: u64 = 26;

/// Converts a column label into its zero-based index.
///
/// The label is trimmed and matched case-insensitively. Empty labels, labels
/// with characters outside `A`-`Z` and labels too long to address are
/// rejected with [`ToolError::InvalidColumnLabel`].
pub fn to_index(label: &str) -> Result<usize> {
    let normalized = label.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(ToolError::InvalidColumnLabel(label.to_string()));
    }

    let mut value: usize = 0;
    for byte in normalized.bytes() {
        if !byte.is_ascii_uppercase() {
            return Err(ToolError::InvalidColumnLabel(label.to_string()));
        }
        let digit = usize::from(byte - b'A' + 1);
        value = value
            .checked_mul(RADIX as usize)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| ToolError::InvalidColumnLabel(label.to_string()))?;
    }

    Ok(value - 1)
}

/// Converts a zero-based column index into its label. Negative indices are
/// rejected with [`ToolError::InvalidColumnIndex`].
pub fn to_label(index: i64) -> Result<String> {
    if index < 0 {
        return Err(ToolError::InvalidColumnIndex(index));
    }
    Ok(label_for(index as u64))
}

fn label_for(index: u64) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        remaining -= 1;
        letters.push(b'A' + (remaining % RADIX) as u8);
        remaining /= RADIX;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// A validated zero-based column reference. It can only be built from a
/// well-formed label or a non-negative index and renders back as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct ColumnRef(usize);

impl ColumnRef {
    /// Wraps an already-validated zero-based index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Zero-based column index.
    pub fn index(self) -> usize {
        self.0
    }

    /// Spreadsheet label for this column.
    pub fn label(self) -> String {
        label_for(self.0 as u64)
    }
}

impl FromStr for ColumnRef {
    type Err = ToolError;

    fn from_str(label: &str) -> Result<Self> {
        to_index(label).map(Self)
    }
}

impl From<ColumnRef> for String {
    fn from(column: ColumnRef) -> Self {
        column.label()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letters_map_to_first_columns() {
        assert_eq!(to_index("A").unwrap(), 0);
        assert_eq!(to_index("B").unwrap(), 1);
        assert_eq!(to_index("Z").unwrap(), 25);
    }

    #[test]
    fn double_letters_follow_z() {
        assert_eq!(to_index("AA").unwrap(), 26);
        assert_eq!(to_index("AZ").unwrap(), 51);
        assert_eq!(to_index("BA").unwrap(), 52);
        assert_eq!(to_index("ZZ").unwrap(), 701);
        assert_eq!(to_index("AAA").unwrap(), 702);
        assert_eq!(to_label(26).unwrap(), "AA");
        assert_eq!(to_label(701).unwrap(), "ZZ");
        assert_eq!(to_label(702).unwrap(), "AAA");
    }

    #[test]
    fn labels_are_trimmed_and_case_insensitive() {
        assert_eq!(to_index("  e ").unwrap(), 4);
        assert_eq!(to_index("aB").unwrap(), 27);
    }

    #[test]
    fn malformed_labels_are_rejected() {
        for label in ["", "   ", "A1", "Ä", "A-B", "1"] {
            assert!(
                matches!(to_index(label), Err(ToolError::InvalidColumnLabel(_))),
                "label {label:?} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_labels_are_rejected() {
        let label = "Z".repeat(40);
        assert!(matches!(
            to_index(&label),
            Err(ToolError::InvalidColumnLabel(_))
        ));
    }

    #[test]
    fn negative_indices_are_rejected() {
        assert!(matches!(
            to_label(-1),
            Err(ToolError::InvalidColumnIndex(-1))
        ));
    }

    #[test]
    fn index_label_index_is_identity() {
        for index in (0..20_000).chain([i64::from(u32::MAX), i64::MAX]) {
            let label = to_label(index).unwrap();
            assert_eq!(to_index(&label).unwrap() as i64, index, "label {label}");
        }
    }

    #[test]
    fn label_index_label_is_identity() {
        let letters: Vec<char> = ('A'..='Z').collect();
        for first in &letters {
            for second in &letters {
                let label = format!("{first}{second}");
                let index = to_index(&label).unwrap();
                assert_eq!(to_label(index as i64).unwrap(), label);
            }
        }
    }

    #[test]
    fn column_ref_parses_and_displays_as_label() {
        let column: ColumnRef = "ab".parse().unwrap();
        assert_eq!(column.index(), 27);
        assert_eq!(column.to_string(), "AB");
        assert!("".parse::<ColumnRef>().is_err());
    }

    #[test]
    fn column_ref_serializes_as_label() {
        let column = ColumnRef::from_index(4);
        let json = serde_json::to_string(&column).unwrap();
        assert_eq!(json, "\"E\"");
    }
}
