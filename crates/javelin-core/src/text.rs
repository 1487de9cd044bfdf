//! Text model primitives: source snapshots, line indexes, and positions.

use std::fmt;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

/// A zero-based (line, byte column) pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        let mut line_ends = Vec::with_capacity(128);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_ends.push(TextSize::from(i as u32));
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_ends.push(TextSize::from(i as u32));
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// End of the line excluding its terminator.
    #[inline]
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        self.line_ends.get(line as usize).copied()
    }

    fn line_index(&self, offset: TextSize) -> usize {
        // Clamp offsets that point past the end; callers may pass `text_len`
        // when referring to EOF.
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a zero-based line/column pair.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.text_len);
        let line = self.line_index(offset);
        let line_start = self.line_starts[line];
        let line_end = self.line_ends[line];
        let col = offset.min(line_end) - line_start;
        LineCol {
            line: line as u32,
            col: u32::from(col),
        }
    }

    /// Convert a zero-based line/column pair back to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let start = self.line_start(line_col.line)?;
        let end = self.line_end(line_col.line)?;
        let offset = start + TextSize::from(line_col.col);
        if offset > end {
            return None;
        }
        Some(offset)
    }
}

/// An immutable UTF-8 source snapshot with its line index.
///
/// Positions everywhere in Javelin are byte offsets into this snapshot;
/// `(line, column)` pairs are derived on demand.
#[derive(Clone)]
pub struct SourceText {
    text: Arc<str>,
    line_index: Arc<LineIndex>,
}

impl SourceText {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_index = Arc::new(LineIndex::new(&text));
        Self { text, line_index }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn len(&self) -> TextSize {
        self.line_index.text_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    #[inline]
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        self.line_index.line_col(offset)
    }

    /// Slice the snapshot; `range` must lie on char boundaries.
    pub fn slice(&self, range: TextRange) -> &str {
        &self.text[usize::from(range.start())..usize::from(range.end())]
    }

    /// Text of `line` excluding its terminator, or `None` past EOF.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let start = self.line_index.line_start(line)?;
        let end = self.line_index.line_end(line)?;
        Some(&self.text[usize::from(start)..usize::from(end)])
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText")
            .field("len", &self.text.len())
            .field("lines", &self.line_index.line_count())
            .finish()
    }
}

impl PartialEq for SourceText {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for SourceText {}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
