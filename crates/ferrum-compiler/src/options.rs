//! Compiler-wide switches that affect lowering, not binding — kept as a
//! small `Copy` struct threaded explicitly rather than a global, per
//! spec.md §5's "no shared mutable state beyond the diagnostic bag, scope
//! cursor, loop stack, and label counter".

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// When `true` (the default), `&&`/`||` lower to true short-circuiting
    /// `ConditionalGoto` chains that skip the untaken operand. When
    /// `false`, both operands are always evaluated — the non-short-circuit
    /// behavior Open Question (3) asked to keep available.
    pub short_circuit_logical_ops: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { short_circuit_logical_ops: true }
    }
}
