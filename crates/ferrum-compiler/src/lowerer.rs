//! Lowers a bound function body into goto-based control flow, the way
//! `plotnik-compiler`'s `compile::lower` pass rewrites oversized IR into
//! cascades of simpler instructions from a monotonic fresh-label counter
//! (see `crates/plotnik-compiler/src/compile/lower.rs`): one forward pass,
//! building each compound node's replacement directly into a `Vec` of
//! flat statements.
//!
//! Desugaring table (spec.md §4.5): `if`/`while`/`do-while`/`for` become
//! `Label`/`Goto`/`ConditionalGoto`, `for` through an intermediate
//! `while`-shaped loop; `break`/`continue` become `Goto` against a
//! lowering-time loop-label stack; `CompoundAssignment`/
//! `CompoundFieldAssignment` become a plain `Assignment`/`FieldAssignment`
//! wrapping a `Binary`; adjacent string-literal concatenation folds.

use crate::binder::bound_tree::{BinaryOperatorKind, BoundBinaryOperator, BoundConstant, BoundExpression, BoundLabel, BoundStatement};
use crate::binder::rewriter::BoundTreeRewriter;
use crate::options::CompilerOptions;
use crate::symbols::TypeSymbol;

/// A fully lowered function body: `Label`/`Goto`/`ConditionalGoto`/
/// `VariableDeclaration`/`ExpressionStatement`/`Return` only, with every
/// nested `Block` flattened into one sequence — the shape `cfg.rs`
/// builds basic blocks over.
pub type LoweredBlock = Vec<BoundStatement>;

/// Lowers `body` and flattens it into a `LoweredBlock`. The single entry
/// point the rest of the pipeline uses.
pub fn lower_body(body: BoundStatement, options: &CompilerOptions) -> LoweredBlock {
    let mut lowerer = Lowerer { next_label: 0, loop_labels: Vec::new(), options };
    flatten(lowerer.rewrite_statement(body))
}

/// Flattens nested `Block`s left behind by lowering into one linear
/// sequence. Only meaningful on an already-lowered tree: `If`/`While`/
/// `DoWhile`/`For`/`Break`/`Continue` never appear here because lowering
/// eliminates every one of them.
fn flatten(statement: BoundStatement) -> LoweredBlock {
    match statement {
        BoundStatement::Block { statements } => statements.into_iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}

struct Lowerer<'a> {
    next_label: u32,
    /// `(continue_target, break_target)` for the loop currently being
    /// lowered; `for`'s continue target is its increment, not its
    /// condition check, so each loop kind pushes its own pair.
    loop_labels: Vec<(BoundLabel, BoundLabel)>,
    options: &'a CompilerOptions,
}

impl<'a> Lowerer<'a> {
    fn fresh_label(&mut self, name: &str) -> BoundLabel {
        let id = self.next_label;
        self.next_label += 1;
        BoundLabel { id, name: format!("{name}_{id}") }
    }

    /// Lowers `condition` directly into `ConditionalGoto`s appended to
    /// `out`: jumps to `true_label` when the condition holds, to
    /// `false_label` otherwise. Recurses through `&&`/`||` to
    /// short-circuit the untaken operand when
    /// `options.short_circuit_logical_ops` is set; otherwise evaluates
    /// the whole expression and branches on it once.
    fn lower_condition(
        &mut self,
        condition: BoundExpression,
        true_label: &BoundLabel,
        false_label: &BoundLabel,
        out: &mut Vec<BoundStatement>,
    ) {
        if self.options.short_circuit_logical_ops {
            if let BoundExpression::Binary { left, operator, right } = &condition {
                if operator.kind == BinaryOperatorKind::LogicalAnd {
                    let left = (**left).clone();
                    let right = (**right).clone();
                    let rhs_label = self.fresh_label("and_rhs");
                    self.lower_condition(left, &rhs_label, false_label, out);
                    out.push(BoundStatement::Label { label: rhs_label });
                    self.lower_condition(right, true_label, false_label, out);
                    return;
                }
                if operator.kind == BinaryOperatorKind::LogicalOr {
                    let left = (**left).clone();
                    let right = (**right).clone();
                    let rhs_label = self.fresh_label("or_rhs");
                    self.lower_condition(left, true_label, &rhs_label, out);
                    out.push(BoundStatement::Label { label: rhs_label });
                    self.lower_condition(right, true_label, false_label, out);
                    return;
                }
            }
        }
        let condition = self.rewrite_expression(condition);
        out.push(BoundStatement::ConditionalGoto { label: true_label.clone(), condition, jump_if_true: true });
        out.push(BoundStatement::Goto { label: false_label.clone() });
    }

    fn lower_if(
        &mut self,
        condition: BoundExpression,
        then_statement: Box<BoundStatement>,
        else_statement: Option<Box<BoundStatement>>,
    ) -> BoundStatement {
        let mut result = Vec::new();
        let then_label = self.fresh_label("then");
        let end_label = self.fresh_label("end_if");

        if let Some(else_statement) = else_statement {
            let else_label = self.fresh_label("else");
            self.lower_condition(condition, &then_label, &else_label, &mut result);
            result.push(BoundStatement::Label { label: then_label });
            result.push(self.rewrite_statement(*then_statement));
            result.push(BoundStatement::Goto { label: end_label.clone() });
            result.push(BoundStatement::Label { label: else_label });
            result.push(self.rewrite_statement(*else_statement));
            result.push(BoundStatement::Label { label: end_label });
        } else {
            self.lower_condition(condition, &then_label, &end_label, &mut result);
            result.push(BoundStatement::Label { label: then_label });
            result.push(self.rewrite_statement(*then_statement));
            result.push(BoundStatement::Label { label: end_label });
        }

        BoundStatement::Block { statements: result }
    }

    fn lower_while(&mut self, condition: BoundExpression, body: Box<BoundStatement>) -> BoundStatement {
        let continue_label = self.fresh_label("while_continue");
        let body_label = self.fresh_label("while_body");
        let break_label = self.fresh_label("while_break");

        let mut result = vec![BoundStatement::Label { label: continue_label.clone() }];
        self.lower_condition(condition, &body_label, &break_label, &mut result);
        result.push(BoundStatement::Label { label: body_label });

        self.loop_labels.push((continue_label.clone(), break_label.clone()));
        result.push(self.rewrite_statement(*body));
        self.loop_labels.pop();

        result.push(BoundStatement::Goto { label: continue_label });
        result.push(BoundStatement::Label { label: break_label });
        BoundStatement::Block { statements: result }
    }

    fn lower_do_while(&mut self, body: Box<BoundStatement>, condition: BoundExpression) -> BoundStatement {
        let body_label = self.fresh_label("do_body");
        let continue_label = self.fresh_label("do_continue");
        let break_label = self.fresh_label("do_break");

        let mut result = vec![BoundStatement::Label { label: body_label.clone() }];
        self.loop_labels.push((continue_label.clone(), break_label.clone()));
        result.push(self.rewrite_statement(*body));
        self.loop_labels.pop();

        result.push(BoundStatement::Label { label: continue_label });
        self.lower_condition(condition, &body_label, &break_label, &mut result);
        result.push(BoundStatement::Label { label: break_label });
        BoundStatement::Block { statements: result }
    }

    /// Desugars through an intermediate `while`: `continue` runs the
    /// increment before re-checking the condition, so the loop gets its
    /// own continue target rather than reusing `while`'s (which would
    /// skip straight to the condition check).
    fn lower_for(
        &mut self,
        initializer: Box<BoundStatement>,
        condition: BoundExpression,
        increment: Box<BoundStatement>,
        body: Box<BoundStatement>,
    ) -> BoundStatement {
        let continue_label = self.fresh_label("for_continue");
        let check_label = self.fresh_label("for_check");
        let body_label = self.fresh_label("for_body");
        let break_label = self.fresh_label("for_break");

        let mut result = vec![self.rewrite_statement(*initializer)];
        result.push(BoundStatement::Goto { label: check_label.clone() });

        result.push(BoundStatement::Label { label: continue_label.clone() });
        result.push(self.rewrite_statement(*increment));

        result.push(BoundStatement::Label { label: check_label });
        self.lower_condition(condition, &body_label, &break_label, &mut result);

        result.push(BoundStatement::Label { label: body_label });
        self.loop_labels.push((continue_label.clone(), break_label.clone()));
        result.push(self.rewrite_statement(*body));
        self.loop_labels.pop();

        result.push(BoundStatement::Goto { label: continue_label });
        result.push(BoundStatement::Label { label: break_label });
        BoundStatement::Block { statements: result }
    }
}

fn is_string_concat(operator: BoundBinaryOperator) -> bool {
    operator.kind == BinaryOperatorKind::Addition && operator.result_type == TypeSymbol::String
}

/// Collects a `+`-chain of strings into its operands, left to right,
/// descending through arbitrarily nested parenthesization.
fn flatten_string_concat(expression: BoundExpression) -> Vec<BoundExpression> {
    match expression {
        BoundExpression::Binary { left, operator, right } if is_string_concat(operator) => {
            let mut parts = flatten_string_concat(*left);
            parts.extend(flatten_string_concat(*right));
            parts
        }
        other => vec![other],
    }
}

/// Merges adjacent constant-string parts in place.
fn fold_adjacent_string_constants(parts: Vec<BoundExpression>) -> Vec<BoundExpression> {
    let mut out: Vec<BoundExpression> = Vec::with_capacity(parts.len());
    for part in parts {
        if let BoundExpression::Literal { value: BoundConstant::String(next), .. } = &part {
            if let Some(BoundExpression::Literal { value: BoundConstant::String(prev), .. }) = out.last_mut() {
                prev.push_str(next);
                continue;
            }
        }
        out.push(part);
    }
    out
}

fn rebuild_string_concat(mut parts: Vec<BoundExpression>, operator: BoundBinaryOperator) -> BoundExpression {
    let first = parts.remove(0);
    parts.into_iter().fold(first, |acc, next| BoundExpression::Binary {
        left: Box::new(acc),
        operator,
        right: Box::new(next),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{VariableKind, VariableSymbol};

    fn var(name: &str, ty: TypeSymbol) -> VariableSymbol {
        VariableSymbol { name: name.to_string(), ty, is_read_only: false, kind: VariableKind::Local }
    }

    fn int_literal(value: i128) -> BoundExpression {
        BoundExpression::Literal { value: BoundConstant::Integer(value), ty: TypeSymbol::Int32 }
    }

    fn string_literal(value: &str) -> BoundExpression {
        BoundExpression::Literal { value: BoundConstant::String(value.to_string()), ty: TypeSymbol::String }
    }

    #[test]
    fn if_without_else_leaves_no_structured_control_flow() {
        let condition = BoundExpression::Literal { value: BoundConstant::Bool(true), ty: TypeSymbol::Bool };
        let then_statement = Box::new(BoundStatement::Return { expression: Some(int_literal(1)) });
        let body = BoundStatement::If { condition, then_statement, else_statement: None };

        let block = lower_body(body, &CompilerOptions::default());
        assert!(!block.iter().any(|s| matches!(s, BoundStatement::If { .. })));
        assert!(block.iter().any(|s| matches!(s, BoundStatement::ConditionalGoto { .. })));
        assert!(block.iter().any(|s| matches!(s, BoundStatement::Return { .. })));
    }

    #[test]
    fn while_lowers_to_a_condition_check_before_the_body_and_a_jump_back() {
        let condition = BoundExpression::Literal { value: BoundConstant::Bool(true), ty: TypeSymbol::Bool };
        let body = Box::new(BoundStatement::ExpressionStatement { expression: int_literal(1) });
        let statement = BoundStatement::While { condition, body };

        let block = lower_body(statement, &CompilerOptions::default());
        assert!(!block.iter().any(|s| matches!(s, BoundStatement::While { .. })));
        let gotos = block.iter().filter(|s| matches!(s, BoundStatement::Goto { .. })).count();
        assert_eq!(gotos, 1, "expected exactly the back-edge jump to the loop's continue label");
    }

    #[test]
    fn break_and_continue_resolve_against_the_innermost_loop() {
        let condition = BoundExpression::Literal { value: BoundConstant::Bool(true), ty: TypeSymbol::Bool };
        let body = Box::new(BoundStatement::Block {
            statements: vec![
                BoundStatement::ExpressionStatement { expression: int_literal(1) },
                BoundStatement::Break,
                BoundStatement::Continue,
            ],
        });
        let statement = BoundStatement::While { condition, body };

        let block = lower_body(statement, &CompilerOptions::default());
        assert!(!block.iter().any(|s| matches!(s, BoundStatement::Break | BoundStatement::Continue)));
    }

    #[test]
    fn compound_assignment_desugars_into_a_binary_read_and_a_plain_assignment() {
        let x = var("x", TypeSymbol::Int32);
        let operator = BoundBinaryOperator {
            kind: BinaryOperatorKind::Addition,
            left_type: TypeSymbol::Int32,
            right_type: TypeSymbol::Int32,
            result_type: TypeSymbol::Int32,
        };
        let expression = BoundExpression::CompoundAssignment {
            variable: x.clone(),
            operator,
            expression: Box::new(int_literal(1)),
        };
        let statement = BoundStatement::ExpressionStatement { expression };

        let block = lower_body(statement, &CompilerOptions::default());
        let BoundStatement::ExpressionStatement { expression } = &block[0] else {
            panic!("expected a single expression statement, got {block:?}");
        };
        let BoundExpression::Assignment { variable, expression } = expression else {
            panic!("compound assignment did not desugar into a plain assignment: {expression:?}");
        };
        assert_eq!(variable.name, "x");
        assert!(matches!(**expression, BoundExpression::Binary { operator, .. } if operator.kind == BinaryOperatorKind::Addition));
    }

    #[test]
    fn adjacent_string_literals_fold_into_one_constant() {
        let operator = BoundBinaryOperator {
            kind: BinaryOperatorKind::Addition,
            left_type: TypeSymbol::String,
            right_type: TypeSymbol::String,
            result_type: TypeSymbol::String,
        };
        let expression = BoundExpression::Binary {
            left: Box::new(string_literal("foo")),
            operator,
            right: Box::new(string_literal("bar")),
        };
        let statement = BoundStatement::ExpressionStatement { expression };

        let block = lower_body(statement, &CompilerOptions::default());
        let BoundStatement::ExpressionStatement { expression } = &block[0] else {
            panic!("expected a single expression statement, got {block:?}");
        };
        assert!(
            matches!(expression, BoundExpression::Literal { value: BoundConstant::String(s), .. } if s == "foobar"),
            "expected folded constant \"foobar\", got {expression:?}"
        );
    }
}

impl<'a> BoundTreeRewriter for Lowerer<'a> {
    fn rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        match statement {
            BoundStatement::If { condition, then_statement, else_statement } => {
                self.lower_if(condition, then_statement, else_statement)
            }
            BoundStatement::While { condition, body } => self.lower_while(condition, body),
            BoundStatement::DoWhile { body, condition } => self.lower_do_while(body, condition),
            BoundStatement::For { initializer, condition, increment, body } => {
                self.lower_for(initializer, condition, increment, body)
            }
            BoundStatement::Break => {
                let (_, break_label) =
                    self.loop_labels.last().expect("binder rejects break outside a loop before lowering runs");
                BoundStatement::Goto { label: break_label.clone() }
            }
            BoundStatement::Continue => {
                let (continue_label, _) =
                    self.loop_labels.last().expect("binder rejects continue outside a loop before lowering runs");
                BoundStatement::Goto { label: continue_label.clone() }
            }
            other => self.default_rewrite_statement(other),
        }
    }

    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        match expression {
            BoundExpression::CompoundAssignment { variable, operator, expression } => {
                let expression = self.rewrite_expression(*expression);
                BoundExpression::Assignment {
                    expression: Box::new(BoundExpression::Binary {
                        left: Box::new(BoundExpression::Variable { variable: variable.clone() }),
                        operator,
                        right: Box::new(expression),
                    }),
                    variable,
                }
            }
            BoundExpression::CompoundFieldAssignment { instance, field, operator, expression } => {
                // `instance` is re-evaluated once for the read and once
                // for the write; safe because the grammar only ever binds
                // a variable/field-access/`this` chain here, none of
                // which has a side effect.
                let instance = self.rewrite_expression(*instance);
                let expression = self.rewrite_expression(*expression);
                BoundExpression::FieldAssignment {
                    expression: Box::new(BoundExpression::Binary {
                        left: Box::new(BoundExpression::FieldAccess {
                            instance: Box::new(instance.clone()),
                            field: field.clone(),
                        }),
                        operator,
                        right: Box::new(expression),
                    }),
                    instance: Box::new(instance),
                    field,
                }
            }
            BoundExpression::Binary { left, operator, right } if is_string_concat(operator) => {
                let left = self.rewrite_expression(*left);
                let right = self.rewrite_expression(*right);
                let combined = BoundExpression::Binary { left: Box::new(left), operator, right: Box::new(right) };
                let parts = fold_adjacent_string_constants(flatten_string_concat(combined));
                rebuild_string_concat(parts, operator)
            }
            other => self.default_rewrite_expression(other),
        }
    }
}
