//! Byte-range text edits and their application.

use text_size::{TextRange, TextSize};

/// A replacement of one byte range with new text.
///
/// An empty `replacement` deletes the range; an empty range inserts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::new(offset, offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, "")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EditError {
    RangeOutOfBounds {
        range: TextRange,
        text_len: TextSize,
    },
    InvalidUtf8Boundary {
        offset: TextSize,
    },
    OverlappingEdits {
        first: TextRange,
        second: TextRange,
    },
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::RangeOutOfBounds { range, text_len } => write!(
                f,
                "edit range {range:?} is out of bounds for text length {text_len:?}"
            ),
            EditError::InvalidUtf8Boundary { offset } => {
                write!(f, "offset {offset:?} is not a UTF-8 character boundary")
            }
            EditError::OverlappingEdits { first, second } => {
                write!(f, "overlapping edits: {first:?} overlaps {second:?}")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Apply a list of edits to a text snapshot.
///
/// Deterministic: edits are first sorted by `(start, end)` and applied from
/// the end of the text backwards so earlier offsets stay valid.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let mut out = text.to_string();
    for edit in edits.into_iter().rev() {
        let start = u32::from(edit.range.start()) as usize;
        let end = u32::from(edit.range.end()) as usize;
        debug_assert!(out.is_char_boundary(start) && out.is_char_boundary(end));
        out.replace_range(start..end, &edit.replacement);
    }
    Ok(out)
}

/// Sort edits and reject overlaps and out-of-bounds ranges.
///
/// Unlike an editor's edit stream, formatter fixes are never merged here:
/// any overlap (including two insertions at the same offset) is an error so
/// the caller can fall back to "no rewrite".
pub fn normalize_text_edits(text: &str, edits: &mut [TextEdit]) -> Result<(), EditError> {
    edits.sort_by_key(|e| (e.range.start(), e.range.end()));

    let text_len = TextSize::from(text.len() as u32);

    for edit in edits.iter() {
        if edit.range.start() > edit.range.end() || edit.range.end() > text_len {
            return Err(EditError::RangeOutOfBounds {
                range: edit.range,
                text_len,
            });
        }

        let start = u32::from(edit.range.start()) as usize;
        let end = u32::from(edit.range.end()) as usize;
        if !text.is_char_boundary(start) {
            return Err(EditError::InvalidUtf8Boundary {
                offset: edit.range.start(),
            });
        }
        if !text.is_char_boundary(end) {
            return Err(EditError::InvalidUtf8Boundary {
                offset: edit.range.end(),
            });
        }
    }

    for pair in edits.windows(2) {
        let first = &pair[0];
        let second = &pair[1];
        if first.range.end() > second.range.start()
            || (first.range.start() == first.range.end()
                && second.range.start() == second.range.end()
                && first.range.start() == second.range.start())
        {
            return Err(EditError::OverlappingEdits {
                first: first.range,
                second: second.range,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_multiple_edits_is_order_independent() {
        let text = "abcdef";
        let mut edits = vec![
            TextEdit::new(TextRange::new(TextSize::from(2), TextSize::from(4)), "XX"),
            TextEdit::insert(TextSize::from(0), "!"),
            TextEdit::delete(TextRange::new(TextSize::from(5), TextSize::from(6))),
        ];

        let out1 = apply_text_edits(text, &edits).unwrap();

        edits.reverse();
        let out2 = apply_text_edits(text, &edits).unwrap();

        assert_eq!(out1, out2);
        assert_eq!(out1, "!abXXe");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let text = "abcdef";
        let edits = vec![
            TextEdit::new(TextRange::new(TextSize::from(1), TextSize::from(4)), "X"),
            TextEdit::new(TextRange::new(TextSize::from(3), TextSize::from(5)), "Y"),
        ];

        assert!(matches!(
            apply_text_edits(text, &edits),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn adjacent_edits_are_allowed() {
        let text = "abcdef";
        let edits = vec![
            TextEdit::new(TextRange::new(TextSize::from(0), TextSize::from(2)), "1"),
            TextEdit::new(TextRange::new(TextSize::from(2), TextSize::from(4)), "2"),
        ];
        assert_eq!(apply_text_edits(text, &edits).unwrap(), "12ef");
    }

    #[test]
    fn out_of_bounds_edit_is_rejected() {
        let text = "ab";
        let edits = vec![TextEdit::new(
            TextRange::new(TextSize::from(1), TextSize::from(9)),
            "",
        )];
        assert!(matches!(
            apply_text_edits(text, &edits),
            Err(EditError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn non_char_boundary_is_rejected() {
        let text = "a😀b";
        let edits = vec![TextEdit::new(
            TextRange::new(TextSize::from(2), TextSize::from(3)),
            "x",
        )];
        assert!(matches!(
            apply_text_edits(text, &edits),
            Err(EditError::InvalidUtf8Boundary { .. })
        ));
    }
}
