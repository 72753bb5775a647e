//! Text span and source text types for source location tracking.
//!
//! Positions are character offsets into the source, matching the scanner,
//! which works over a `Vec<char>`.

use std::fmt;
use std::ops::Range;

/// A position in source text, measured in characters from the start.
pub type TextPos = u32;

/// A span in source text, defined by a start position and a length.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextSpan {
    /// The character offset where this span starts.
    pub start: TextPos,
    /// The length of this span in characters.
    pub length: TextPos,
}

impl TextSpan {
    /// Create a new text span.
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// Create a span from start and end positions.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self {
            start: pos,
            length: 0,
        }
    }

    /// The end position of this span (exclusive).
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start && pos < self.end()
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// Return a new span covering both this span and the other.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        TextSpan::from_bounds(start, end)
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// One line of a `SourceText`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextLine {
    pub start: TextPos,
    /// Length without the line break.
    pub length: TextPos,
    pub length_including_line_break: TextPos,
}

impl TextLine {
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.length)
    }

    #[inline]
    pub fn span_including_line_break(&self) -> TextSpan {
        TextSpan::new(self.start, self.length_including_line_break)
    }
}

/// Source text with a precomputed line table.
///
/// `\r\n`, `\r` and `\n` all terminate a line. The line after the final
/// line break always exists, so `".\r\n"` has two lines.
#[derive(Debug, Clone)]
pub struct SourceText {
    file_name: String,
    text: String,
    chars: Vec<char>,
    lines: Vec<TextLine>,
}

impl SourceText {
    pub fn new(file_name: &str, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let lines = Self::parse_lines(&chars);
        Self {
            file_name: file_name.to_string(),
            text: text.to_string(),
            chars,
            lines,
        }
    }

    /// Source text with no file name, as used by the REPL.
    pub fn from_text(text: &str) -> Self {
        Self::new("", text)
    }

    fn parse_lines(chars: &[char]) -> Vec<TextLine> {
        let mut lines = Vec::new();
        let mut position = 0usize;
        let mut line_start = 0usize;

        while position < chars.len() {
            let break_width = match (chars[position], chars.get(position + 1)) {
                ('\r', Some('\n')) => 2,
                ('\r', _) | ('\n', _) => 1,
                _ => 0,
            };

            if break_width == 0 {
                position += 1;
                continue;
            }

            lines.push(TextLine {
                start: line_start as TextPos,
                length: (position - line_start) as TextPos,
                length_including_line_break: (position + break_width - line_start) as TextPos,
            });
            position += break_width;
            line_start = position;
        }

        lines.push(TextLine {
            start: line_start as TextPos,
            length: (position - line_start) as TextPos,
            length_including_line_break: (position - line_start) as TextPos,
        });
        lines
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Index of the line containing `pos`.
    pub fn line_index(&self, pos: TextPos) -> usize {
        match self.lines.binary_search_by(|line| line.start.cmp(&pos)) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        }
    }

    /// The text covered by `span`, clamped to the source.
    pub fn slice(&self, span: TextSpan) -> String {
        let start = (span.start as usize).min(self.chars.len());
        let end = (span.end() as usize).min(self.chars.len());
        self.chars[start..end].iter().collect()
    }

    /// Whether the text contains a line break anywhere.
    pub fn is_multiline(&self) -> bool {
        memchr::memchr2(b'\n', b'\r', self.text.as_bytes()).is_some()
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
