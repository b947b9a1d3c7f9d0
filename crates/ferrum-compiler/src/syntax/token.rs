//! Tokens, trivia, and the literal value payload carried on literal tokens.

use ferrum_core::{SourceText, TextSpan};

use super::kind::SyntaxKind;

/// Classification of a trivia run. Line breaks are their own kind (rather
/// than folded into `Whitespace`) because trailing-trivia attachment stops
/// right after the first one, per spec.md §3/§4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    Whitespace,
    LineBreak,
    LineComment,
    BlockComment,
}

/// A single run of trivia (whitespace, a line break, or a comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxTrivia {
    pub kind: TriviaKind,
    pub span: TextSpan,
}

impl SyntaxTrivia {
    pub fn text<'a>(&self, source: &'a SourceText) -> &'a str {
        source.substring(self.span)
    }
}

/// The promoted numeric value of a number literal. Integer literals widen
/// by range `int32 → uint32 → int64 → uint64`; float literals widen
/// `float32 → float64` when the value isn't exactly representable in
/// `f32`. There is no literal form that produces `float128` directly —
/// that type only appears via explicit conversion (no native Rust `f128`
/// to lex into).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

/// Semantic payload of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Number(NumberValue),
    String(String),
    Char(char),
    Bool(bool),
}

/// A lexed token: kind, its own span (trivia excluded), literal value
/// payload if any, and the trivia attached on either side.
///
/// A *missing* token (`is_missing`) was fabricated by the parser during
/// error recovery: empty text, zero length, shares position with the
/// next real token, and carries no trivia of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxToken {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    pub value: Option<TokenValue>,
    pub leading_trivia: Vec<SyntaxTrivia>,
    pub trailing_trivia: Vec<SyntaxTrivia>,
    pub is_missing: bool,
}

impl SyntaxToken {
    pub fn text<'a>(&self, source: &'a SourceText) -> &'a str {
        source.substring(self.span)
    }

    /// The token's span including its attached trivia on both sides —
    /// used by the lex→join round-trip property (spec.md §8).
    pub fn full_span(&self) -> TextSpan {
        let start = self
            .leading_trivia
            .first()
            .map(|t| t.span.start())
            .unwrap_or(self.span.start());
        let end = self
            .trailing_trivia
            .last()
            .map(|t| t.span.end())
            .unwrap_or(self.span.end());
        TextSpan::new(start, end - start)
    }

    /// Reconstructs `leading + text + trailing` for this token.
    pub fn full_text(&self, source: &SourceText) -> String {
        let mut out = String::new();
        for trivia in &self.leading_trivia {
            out.push_str(trivia.text(source));
        }
        out.push_str(self.text(source));
        for trivia in &self.trailing_trivia {
            out.push_str(trivia.text(source));
        }
        out
    }

    pub fn missing(kind: SyntaxKind, position: usize) -> Self {
        Self {
            kind,
            span: TextSpan::empty_at(position),
            value: None,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
            is_missing: true,
        }
    }
}
