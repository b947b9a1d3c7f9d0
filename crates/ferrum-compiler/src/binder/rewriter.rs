//! `BoundTreeRewriter`: a generic structural post-order visitor over the
//! bound tree, implemented as a `match` over the tagged enums rather
//! than virtual dispatch (spec.md's redesign notes). `rewrite_statement`/
//! `rewrite_expression` provide the default "rebuild with rewritten
//! children, otherwise pass through unchanged" behavior; implementors
//! override only the node kinds they actually transform — this is how
//! the lowerer is built on top of it in `lowerer.rs`.

use super::bound_tree::{BoundExpression, BoundStatement};

pub trait BoundTreeRewriter {
    fn rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        self.default_rewrite_statement(statement)
    }

    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        self.default_rewrite_expression(expression)
    }

    fn default_rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        match statement {
            BoundStatement::Block { statements } => BoundStatement::Block {
                statements: statements.into_iter().map(|s| self.rewrite_statement(s)).collect(),
            },
            BoundStatement::VariableDeclaration { variable, initializer } => BoundStatement::VariableDeclaration {
                variable,
                initializer: self.rewrite_expression(initializer),
            },
            BoundStatement::If { condition, then_statement, else_statement } => BoundStatement::If {
                condition: self.rewrite_expression(condition),
                then_statement: Box::new(self.rewrite_statement(*then_statement)),
                else_statement: else_statement.map(|s| Box::new(self.rewrite_statement(*s))),
            },
            BoundStatement::While { condition, body } => BoundStatement::While {
                condition: self.rewrite_expression(condition),
                body: Box::new(self.rewrite_statement(*body)),
            },
            BoundStatement::DoWhile { body, condition } => BoundStatement::DoWhile {
                body: Box::new(self.rewrite_statement(*body)),
                condition: self.rewrite_expression(condition),
            },
            BoundStatement::For { initializer, condition, increment, body } => BoundStatement::For {
                initializer: Box::new(self.rewrite_statement(*initializer)),
                condition: self.rewrite_expression(condition),
                increment: Box::new(self.rewrite_statement(*increment)),
                body: Box::new(self.rewrite_statement(*body)),
            },
            BoundStatement::Return { expression } => BoundStatement::Return {
                expression: expression.map(|e| self.rewrite_expression(e)),
            },
            BoundStatement::ExpressionStatement { expression } => {
                BoundStatement::ExpressionStatement { expression: self.rewrite_expression(expression) }
            }
            BoundStatement::ConditionalGoto { label, condition, jump_if_true } => BoundStatement::ConditionalGoto {
                label,
                condition: self.rewrite_expression(condition),
                jump_if_true,
            },
            other @ (BoundStatement::Break
            | BoundStatement::Continue
            | BoundStatement::Goto { .. }
            | BoundStatement::Label { .. }) => other,
        }
    }

    fn default_rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        match expression {
            BoundExpression::Assignment { variable, expression } => BoundExpression::Assignment {
                variable,
                expression: Box::new(self.rewrite_expression(*expression)),
            },
            BoundExpression::FieldAssignment { instance, field, expression } => BoundExpression::FieldAssignment {
                instance: Box::new(self.rewrite_expression(*instance)),
                field,
                expression: Box::new(self.rewrite_expression(*expression)),
            },
            BoundExpression::CompoundAssignment { variable, operator, expression } => {
                BoundExpression::CompoundAssignment {
                    variable,
                    operator,
                    expression: Box::new(self.rewrite_expression(*expression)),
                }
            }
            BoundExpression::CompoundFieldAssignment { instance, field, operator, expression } => {
                BoundExpression::CompoundFieldAssignment {
                    instance: Box::new(self.rewrite_expression(*instance)),
                    field,
                    operator,
                    expression: Box::new(self.rewrite_expression(*expression)),
                }
            }
            BoundExpression::Unary { operator, operand } => {
                BoundExpression::Unary { operator, operand: Box::new(self.rewrite_expression(*operand)) }
            }
            BoundExpression::Binary { left, operator, right } => BoundExpression::Binary {
                left: Box::new(self.rewrite_expression(*left)),
                operator,
                right: Box::new(self.rewrite_expression(*right)),
            },
            BoundExpression::Call { function, instance, arguments, return_type } => BoundExpression::Call {
                function,
                instance: instance.map(|i| Box::new(self.rewrite_expression(*i))),
                arguments: arguments.into_iter().map(|a| self.rewrite_expression(a)).collect(),
                return_type,
            },
            BoundExpression::Conversion { expression, ty, explicit } => BoundExpression::Conversion {
                expression: Box::new(self.rewrite_expression(*expression)),
                ty,
                explicit,
            },
            BoundExpression::FieldAccess { instance, field } => {
                BoundExpression::FieldAccess { instance: Box::new(self.rewrite_expression(*instance)), field }
            }
            other @ (BoundExpression::Error { .. }
            | BoundExpression::Literal { .. }
            | BoundExpression::Variable { .. }
            | BoundExpression::This { .. }) => other,
        }
    }
}
