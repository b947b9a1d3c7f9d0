//! Shared vocabulary for the Ferrum compiler pipeline: immutable source
//! text, byte-offset spans/locations, and the diagnostic data model every
//! later stage threads through without ever throwing.

pub mod diagnostics;
pub mod source_text;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity};
pub use source_text::{SourceText, SourceTextError};
pub use text::{TextLocation, TextSpan};
