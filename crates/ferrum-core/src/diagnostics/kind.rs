//! The full catalogue of user-visible diagnostic kinds (spec.md §7).

/// Every diagnostic the pipeline can emit, tagged so callers can match on
/// the condition rather than parse rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    // Lexer
    BadCharacter,
    UnterminatedString,
    UnterminatedCharacter,
    InvalidCharacterLiteral,
    UnterminatedComment,
    InvalidNumber,

    // Parser
    UnexpectedToken,

    // Binder: name resolution
    UndefinedType,
    UndefinedVariable,
    UndefinedFunction,
    NotAFunction,
    NotAVariable,
    NotAClass,
    SymbolAlreadyDeclared,
    ParameterAlreadyDeclared,
    UndefinedClassField,
    CannotUseThisOutsideOfReceiver,

    // Binder: type checking & conversions
    CannotAssign,
    CannotConvert,
    CannotConvertImplicitly,
    UndefinedUnaryOperator,
    UndefinedBinaryOperator,
    ExpressionMustHaveValue,

    // Binder: control flow
    InvalidBreakOrContinue,
    InvalidReturnExpression,
    MissingReturnExpression,
    AllPathsMustReturn,
    InvalidExpressionStatement,
    DivideByZero,

    // CFG
    UnreachableCode,

    // Program shape
    CannotMixMainAndGlobalStatements,
    MainMustHaveCorrectSignature,
    OnlyOneFileCanHaveGlobalStatements,

    // Emitter contract (reference resolution; kept for completeness even
    // though the emitter itself is out of scope)
    InvalidReference,
    RequiredTypeNotFound,
    RequiredTypeAmbiguous,
    RequiredMethodNotFound,
}

impl DiagnosticKind {
    /// Whether this kind is always a warning rather than an error.
    ///
    /// Only `UnreachableCode` is a warning today; everything else blocks
    /// emission per spec.md §7.
    pub const fn default_severity(self) -> super::Severity {
        match self {
            DiagnosticKind::UnreachableCode => super::Severity::Warning,
            _ => super::Severity::Error,
        }
    }
}
