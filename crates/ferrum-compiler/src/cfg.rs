//! Control-flow graph over a lowered function body: basic blocks split at
//! `Label`/`Goto`/`ConditionalGoto`/`Return` boundaries, plus the
//! `all_paths_return` reachability analysis spec.md §4.6 asks for.
//!
//! Bound statements carry no source span (see `binder::bound_tree`'s doc
//! comment), so every diagnostic this module raises is anchored at the
//! owning function's declaration location, the same granularity
//! `binder::check_all_paths_return`'s pre-lowering approximation already
//! uses.

use ferrum_core::{DiagnosticBag, DiagnosticKind, TextLocation};

use crate::binder::bound_tree::{BoundLabel, BoundStatement};
use crate::lowerer::LoweredBlock;
use crate::symbols::TypeSymbol;

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub statements: Vec<BoundStatement>,
    pub is_start: bool,
    pub is_end: bool,
}

/// `blocks[0]` is the dedicated `Start` node, `blocks[blocks.len() - 1]`
/// the dedicated `End` node; everything between is a real basic block in
/// source order. `edges[i]` lists `i`'s successors.
pub struct ControlFlowGraph {
    pub blocks: Vec<BasicBlock>,
    pub edges: Vec<Vec<usize>>,
}

impl ControlFlowGraph {
    fn end_index(&self) -> usize {
        self.blocks.len() - 1
    }

    fn reachable_from_start(&self) -> Vec<bool> {
        let mut visited = vec![false; self.blocks.len()];
        let mut stack = vec![0usize];
        visited[0] = true;
        while let Some(index) = stack.pop() {
            for &successor in &self.edges[index] {
                if !visited[successor] {
                    visited[successor] = true;
                    stack.push(successor);
                }
            }
        }
        visited
    }

    /// Real (non-sentinel) blocks `Start` cannot reach at all.
    pub fn unreachable_blocks(&self) -> Vec<usize> {
        let reachable = self.reachable_from_start();
        let end = self.end_index();
        (1..end).filter(|&index| !reachable[index]).collect()
    }

    /// Holds iff every `Start`→`End` path passes through a block ending
    /// in `Return`. Walks forward from `Start`, refusing to step past a
    /// returning block — if that walk still reaches `End`, some path
    /// falls off the function without returning.
    pub fn all_paths_return(&self) -> bool {
        let end = self.end_index();
        let mut visited = vec![false; self.blocks.len()];
        let mut stack = vec![0usize];
        visited[0] = true;
        while let Some(index) = stack.pop() {
            if index == end {
                return false;
            }
            if matches!(self.blocks[index].statements.last(), Some(BoundStatement::Return { .. })) {
                continue;
            }
            for &successor in &self.edges[index] {
                if !visited[successor] {
                    visited[successor] = true;
                    stack.push(successor);
                }
            }
        }
        true
    }
}

fn partition_into_blocks(statements: &[BoundStatement]) -> Vec<Vec<BoundStatement>> {
    let mut blocks = Vec::new();
    let mut current: Vec<BoundStatement> = Vec::new();
    for statement in statements {
        match statement {
            BoundStatement::Label { .. } => {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                current.push(statement.clone());
            }
            BoundStatement::Goto { .. } | BoundStatement::ConditionalGoto { .. } | BoundStatement::Return { .. } => {
                current.push(statement.clone());
                blocks.push(std::mem::take(&mut current));
            }
            _ => current.push(statement.clone()),
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn find_label_block(blocks: &[BasicBlock], from: usize, to: usize, target: &BoundLabel) -> usize {
    (from..to)
        .find(|&index| matches!(blocks[index].statements.first(), Some(BoundStatement::Label { label }) if label.id == target.id))
        .expect("lowerer never emits a jump to an undeclared label")
}

/// Builds the graph for one lowered function body.
pub fn build(statements: &LoweredBlock) -> ControlFlowGraph {
    let partitioned = partition_into_blocks(statements);

    let mut blocks = Vec::with_capacity(partitioned.len() + 2);
    blocks.push(BasicBlock { statements: Vec::new(), is_start: true, is_end: false });
    for statements in partitioned {
        blocks.push(BasicBlock { statements, is_start: false, is_end: false });
    }
    let end = blocks.len();
    blocks.push(BasicBlock { statements: Vec::new(), is_start: false, is_end: true });

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];
    edges[0].push(if end > 1 { 1 } else { end });

    for index in 1..end {
        let fallthrough = if index + 1 < end { index + 1 } else { end };
        match blocks[index].statements.last() {
            Some(BoundStatement::Goto { label }) => {
                edges[index].push(find_label_block(&blocks, 1, end, label));
            }
            Some(BoundStatement::ConditionalGoto { label, .. }) => {
                edges[index].push(find_label_block(&blocks, 1, end, label));
                edges[index].push(fallthrough);
            }
            Some(BoundStatement::Return { .. }) => {
                edges[index].push(end);
            }
            _ => edges[index].push(fallthrough),
        }
    }

    ControlFlowGraph { blocks, edges }
}

/// Builds the graph, reports `UnreachableCode`/`AllPathsMustReturn`
/// against it, and hands the graph back so callers (tests, a future
/// emitter) can inspect it further.
pub fn analyze(
    statements: &LoweredBlock,
    return_type: TypeSymbol,
    location: TextLocation,
    diagnostics: &mut DiagnosticBag,
) -> ControlFlowGraph {
    let graph = build(statements);

    for _ in &graph.unreachable_blocks() {
        diagnostics.push(DiagnosticKind::UnreachableCode, location.clone(), "unreachable code");
    }

    if return_type != TypeSymbol::Void && !graph.all_paths_return() {
        diagnostics.push(DiagnosticKind::AllPathsMustReturn, location, "not all code paths return a value");
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bound_tree::{BoundConstant, BoundExpression};
    use crate::symbols::{VariableKind, VariableSymbol};

    fn ret(value: i128) -> BoundStatement {
        BoundStatement::Return {
            expression: Some(BoundExpression::Literal { value: BoundConstant::Integer(value), ty: TypeSymbol::Int32 }),
        }
    }

    #[test]
    fn straight_line_body_has_all_paths_return() {
        let body: LoweredBlock = vec![ret(1)];
        let graph = build(&body);
        assert!(graph.all_paths_return());
        assert!(graph.unreachable_blocks().is_empty());
    }

    #[test]
    fn empty_body_does_not_return_on_every_path() {
        let body: LoweredBlock = vec![];
        let graph = build(&body);
        assert!(!graph.all_paths_return());
    }

    #[test]
    fn branch_with_only_one_arm_returning_is_incomplete() {
        let then_label = BoundLabel { id: 0, name: "then_0".to_string() };
        let end_label = BoundLabel { id: 1, name: "end_if_1".to_string() };
        let condition = BoundExpression::Literal { value: BoundConstant::Bool(true), ty: TypeSymbol::Bool };
        let body: LoweredBlock = vec![
            BoundStatement::ConditionalGoto { label: then_label.clone(), condition, jump_if_true: true },
            BoundStatement::Goto { label: end_label.clone() },
            BoundStatement::Label { label: then_label },
            ret(1),
            BoundStatement::Label { label: end_label },
            BoundStatement::ExpressionStatement {
                expression: BoundExpression::Variable {
                    variable: VariableSymbol {
                        name: "x".to_string(),
                        ty: TypeSymbol::Int32,
                        is_read_only: false,
                        kind: VariableKind::Local,
                    },
                },
            },
        ];
        let graph = build(&body);
        assert!(!graph.all_paths_return());
    }

    #[test]
    fn code_after_an_unconditional_goto_is_unreachable() {
        let target = BoundLabel { id: 0, name: "end_0".to_string() };
        let body: LoweredBlock = vec![
            BoundStatement::Goto { label: target.clone() },
            ret(1),
            BoundStatement::Label { label: target },
            ret(2),
        ];
        let graph = build(&body);
        assert_eq!(graph.unreachable_blocks().len(), 1);
    }
}
