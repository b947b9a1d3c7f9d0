//! Immutable text backing store with a precomputed line map.
//!
//! `SourceText` is the one piece of mutable-looking state every later stage
//! reads through: a `TextLocation` only makes sense paired with the
//! `SourceText` it was carved from. Line/column lookup is O(log n) via
//! binary search over precomputed line-start offsets, the same shape as
//! `line_index`/`line_number` tables in hand-written compiler front-ends.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::text::TextSpan;

/// System-boundary failure reading a `SourceText` from disk.
///
/// Distinct from `Diagnostic`: this is raised before any lexing happens,
/// so there is no location to attach it to.
#[derive(Debug, thiserror::Error)]
pub enum SourceTextError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable source text plus a precomputed line-start table.
///
/// Cheap to clone (`Arc`-backed): every token, trivia, and diagnostic in a
/// compilation carries a handle to the same `SourceText`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceText {
    inner: Arc<Inner>,
}

#[derive(Debug, PartialEq, Eq)]
struct Inner {
    filename: Option<String>,
    text: String,
    /// Byte offset of the start of each line. Always non-empty; `[0]` is
    /// the start of line 0 even for empty input.
    line_starts: Vec<usize>,
}

impl SourceText {
    /// Builds a `SourceText` from in-memory content with no associated file.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_filename(text, None::<String>)
    }

    /// Builds a `SourceText` with an associated filename, used only for
    /// diagnostic display.
    pub fn with_filename(text: impl Into<String>, filename: Option<impl Into<String>>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            inner: Arc::new(Inner {
                filename: filename.map(Into::into),
                text,
                line_starts,
            }),
        }
    }

    /// Reads a file from disk into a `SourceText` with its path recorded as
    /// the filename.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceTextError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceTextError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::with_filename(text, Some(path.display().to_string())))
    }

    pub fn filename(&self) -> Option<&str> {
        self.inner.filename.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.inner.text
    }

    pub fn len(&self) -> usize {
        self.inner.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.text.is_empty()
    }

    /// Slices the source text by a byte span. Panics if the span is out of
    /// range — callers only ever construct spans from this same text.
    pub fn substring(&self, span: TextSpan) -> &str {
        &self.inner.text[span.start()..span.end()]
    }

    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.inner.text.as_bytes().get(offset).copied()
    }

    /// Number of lines in the text (always ≥ 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.inner.line_starts.len()
    }

    /// Zero-based line index containing `offset`.
    pub fn line_index(&self, offset: usize) -> usize {
        match self.inner.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Zero-based `(line, column)` for a byte offset.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let line = self.line_index(offset);
        let line_start = self.inner.line_starts[line];
        (line, offset - line_start)
    }

    /// The text of a single zero-based line, trivia (line break) excluded.
    pub fn line_text(&self, line: usize) -> &str {
        let start = self.inner.line_starts[line];
        let end = self
            .inner
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.inner.text.len());
        self.inner.text[start..end]
            .trim_end_matches(['\n', '\r'])
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.text)
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                let next = if bytes.get(i + 1) == Some(&b'\n') { i + 2 } else { i + 1 };
                starts.push(next);
                i = next;
            }
            b'\n' => {
                starts.push(i + 1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_one_line() {
        let text = SourceText::new("");
        assert_eq!(text.line_count(), 1);
        assert_eq!(text.line_column(0), (0, 0));
    }

    #[test]
    fn line_starts_track_lf_and_crlf() {
        let text = SourceText::new("a\nbb\r\nccc");
        assert_eq!(text.line_count(), 3);
        assert_eq!(text.line_text(0), "a");
        assert_eq!(text.line_text(1), "bb");
        assert_eq!(text.line_text(2), "ccc");
    }

    #[test]
    fn line_column_lookup() {
        let text = SourceText::new("abc\ndef\nghi");
        assert_eq!(text.line_column(0), (0, 0));
        assert_eq!(text.line_column(4), (1, 0));
        assert_eq!(text.line_column(6), (1, 2));
        assert_eq!(text.line_column(10), (2, 2));
    }

    #[test]
    fn substring_slices_by_span() {
        let text = SourceText::new("hello world");
        assert_eq!(text.substring(TextSpan::new(6, 5)), "world");
    }
}
