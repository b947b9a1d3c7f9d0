//! End-to-end scenarios (spec.md §8): full programs through
//! `Compilation::compile`, asserted on `DiagnosticBag` contents and the
//! bound/lowered shape `emit()` hands back.

use ferrum_compiler::binder::bound_tree::{BoundConstant, BoundExpression, BoundStatement};
use ferrum_compiler::symbols::TypeSymbol;
use ferrum_compiler::Compilation;
use ferrum_core::{DiagnosticKind, SourceText};
use indoc::indoc;

fn compile(source: &str) -> Compilation {
    Compilation::compile(vec![SourceText::new(source)])
}

fn diagnostic_kinds(compilation: &Compilation) -> Vec<DiagnosticKind> {
    compilation.diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn integer_widening_folds_to_a_constant_of_the_widened_type() {
    let compilation = compile(indoc! {"
        function main(): void {
            var x: int64 = 1 + 2;
        }
    "});
    assert!(diagnostic_kinds(&compilation).is_empty());

    let main = compilation.main_function();
    let result = compilation.emit().expect("zero diagnostics means emission succeeds");
    let body = &result.functions[&main];
    let BoundStatement::VariableDeclaration { initializer, .. } = &body[0] else {
        panic!("expected a variable declaration, got {:?}", body[0]);
    };
    assert!(
        matches!(initializer, BoundExpression::Literal { value: BoundConstant::Integer(3), ty: TypeSymbol::Int64 }),
        "expected folded constant 3i64, got {initializer:?}"
    );
}

#[test]
fn reassigning_a_const_is_rejected() {
    let compilation = compile(indoc! {"
        function main(): void {
            const k = 1;
            k = 2;
        }
    "});
    assert_eq!(diagnostic_kinds(&compilation), vec![DiagnosticKind::CannotAssign]);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.location.slice(), "k");
    assert!(compilation.emit().is_none());
}

#[test]
fn dividing_by_a_constant_zero_is_rejected_and_does_not_bind_a_binary_node() {
    let compilation = compile(indoc! {"
        function main(): void {
            var x = 10 / 0;
        }
    "});
    assert_eq!(diagnostic_kinds(&compilation), vec![DiagnosticKind::DivideByZero]);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.location.slice(), "/");
    assert!(compilation.emit().is_none());
}

#[test]
fn an_always_false_condition_marks_its_then_branch_unreachable() {
    let compilation = compile(indoc! {r#"
        function main(): void {
            if false {
                writeLine("a");
            } else {
                writeLine("b");
            }
        }
    "#});
    assert_eq!(diagnostic_kinds(&compilation), vec![DiagnosticKind::UnreachableCode]);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert!(diagnostic.location.slice().contains("writeLine(\"a\")"));
    // A warning, not an error: the rest of the function still emits.
    assert!(compilation.emit().is_some());
}

#[test]
fn an_always_true_condition_marks_its_else_branch_unreachable() {
    let compilation = compile(indoc! {r#"
        function main(): void {
            if true {
                writeLine("a");
            } else {
                writeLine("b");
            }
        }
    "#});
    assert_eq!(diagnostic_kinds(&compilation), vec![DiagnosticKind::UnreachableCode]);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert!(diagnostic.location.slice().contains("writeLine(\"b\")"));
}

#[test]
fn a_class_with_one_writable_field_gets_a_zero_arg_and_a_full_arg_constructor() {
    let compilation = compile(indoc! {"
        class P {
            x: int32;
            const tag: string;
        }
        function main(): void {
            var p = P(7);
        }
    "});
    assert!(diagnostic_kinds(&compilation).is_empty());

    let &class_id = compilation.global_scope().classes.get("P").expect("class P is declared");
    let class = compilation.symbols.class(class_id);
    assert_eq!(class.fields.len(), 2);
    assert!(class.full_ctor.is_some(), "a writable field must synthesize the full-argument constructor");

    let default_ctor = compilation.symbols.function(class.default_ctor);
    assert!(default_ctor.parameters.is_empty());

    let full_ctor = compilation.symbols.function(class.full_ctor.unwrap());
    assert_eq!(full_ctor.parameters.len(), 1, "the const field 'tag' is not a constructor parameter");
    assert_eq!(full_ctor.parameters[0].name, "x");
    assert_eq!(full_ctor.parameters[0].ty, TypeSymbol::Int32);
}

#[test]
fn a_function_with_an_incomplete_if_is_missing_a_return_on_some_path() {
    let compilation = compile(indoc! {"
        function f(): int32 {
            if true {
                return 1;
            }
        }
    "});
    assert_eq!(diagnostic_kinds(&compilation), vec![DiagnosticKind::AllPathsMustReturn]);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.location.slice(), "f");
    assert!(compilation.emit().is_none());
}

#[test]
fn lowering_removes_every_structured_control_flow_node() {
    let compilation = compile(indoc! {"
        function f(): int32 {
            var total = 0;
            var i = 0;
            while i < 10 {
                if i % 2 == 0 {
                    total += i;
                }
                i += 1;
            }
            return total;
        }
    "});
    assert!(diagnostic_kinds(&compilation).is_empty());

    let &f_id = compilation.global_scope().functions.get("f").expect("function f is declared");
    let result = compilation.emit().expect("zero diagnostics means emission succeeds");
    let body = &result.functions[&f_id];

    fn assert_fully_lowered(statement: &BoundStatement) {
        match statement {
            BoundStatement::If { .. }
            | BoundStatement::While { .. }
            | BoundStatement::DoWhile { .. }
            | BoundStatement::For { .. }
            | BoundStatement::Break
            | BoundStatement::Continue => panic!("structured control flow survived lowering: {statement:?}"),
            BoundStatement::Block { statements } => statements.iter().for_each(assert_fully_lowered),
            _ => {}
        }
    }
    body.iter().for_each(assert_fully_lowered);

    fn assert_no_compound_assignment(expression: &BoundExpression) {
        assert!(
            !matches!(expression, BoundExpression::CompoundAssignment { .. } | BoundExpression::CompoundFieldAssignment { .. }),
            "compound assignment survived lowering: {expression:?}"
        );
    }
    for statement in body {
        if let BoundStatement::ExpressionStatement { expression } = statement {
            assert_no_compound_assignment(expression);
        }
    }
}
