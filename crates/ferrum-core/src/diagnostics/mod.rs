//! Compiler diagnostics infrastructure.
//!
//! Diagnostics are pure data: a `DiagnosticBag` only ever grows, in
//! declaration order, for the lifetime of a single pipeline run. Nothing
//! in the pipeline ever throws a user-facing error; this module is the
//! entire surface for reporting one.

mod kind;

pub use kind::DiagnosticKind;

use crate::text::TextLocation;

/// Severity of a diagnostic. Only `UnreachableCode` defaults to `Warning`
/// today (see `DiagnosticKind::default_severity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic: what went wrong, where, and how severe it is.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub location: TextLocation,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ((line, col), _) = self.location.line_range();
        write!(
            f,
            "{}: {} ({}:{})",
            self.severity,
            self.message,
            line + 1,
            col + 1
        )
    }
}

/// Builder returned by `DiagnosticBag::error`/`warning`, mirroring the
/// teacher's `DiagnosticBuilder` — nothing is recorded until `.emit()`.
#[must_use = "diagnostic not recorded until .emit() is called"]
pub struct DiagnosticBuilder<'a> {
    bag: &'a mut DiagnosticBag,
    diagnostic: Diagnostic,
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn emit(self) {
        self.bag.diagnostics.push(self.diagnostic);
    }
}

/// Accumulates diagnostics in declaration order across an entire
/// compilation. Never read mid-stage; only appended to.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        location: TextLocation,
        message: impl Into<String>,
    ) -> DiagnosticBuilder<'_> {
        let severity = kind.default_severity();
        DiagnosticBuilder {
            bag: self,
            diagnostic: Diagnostic {
                kind,
                severity,
                location,
                message: message.into(),
            },
        }
    }

    /// Shorthand for `report(..).emit()`, used throughout the pipeline
    /// where no extra builder chaining is needed.
    pub fn push(&mut self, kind: DiagnosticKind, location: TextLocation, message: impl Into<String>) {
        self.report(kind, location, message).emit();
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Appends another bag's diagnostics, preserving relative order
    /// between the two (used when a stage merges sub-results).
    pub fn extend(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Diagnostics sorted by source position, used only for display —
    /// accumulation order (declaration order) remains the one threaded
    /// through the pipeline itself.
    pub fn sorted_by_location(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.diagnostics.iter().collect();
        sorted.sort_by_key(|d| d.location.span);
        sorted
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_text::SourceText;
    use crate::text::TextSpan;

    fn loc(start: usize, len: usize) -> TextLocation {
        TextLocation::new(SourceText::new("var x = 10 / 0;"), TextSpan::new(start, len))
    }

    #[test]
    fn reporting_accumulates_in_order() {
        let mut bag = DiagnosticBag::new();
        bag.push(DiagnosticKind::DivideByZero, loc(12, 1), "division by zero");
        bag.push(DiagnosticKind::UnreachableCode, loc(0, 3), "unreachable");
        assert_eq!(bag.len(), 2);
        assert!(bag.has_errors());
        let kinds: Vec<_> = bag.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::DivideByZero, DiagnosticKind::UnreachableCode]
        );
    }

    #[test]
    fn warning_only_kinds_do_not_count_as_errors() {
        let mut bag = DiagnosticBag::new();
        bag.push(DiagnosticKind::UnreachableCode, loc(0, 1), "unreachable");
        assert!(!bag.has_errors());
    }
}
