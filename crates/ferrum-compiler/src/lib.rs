//! Ferrum compiler: lexer, parser, symbol table, binder, lowerer, and
//! control-flow analysis.
//!
//! - `syntax` — lexer, Pratt/precedence-climbing parser, arena `SyntaxTree`
//! - `symbols` — `ClassId`/`FunctionId` arenas and `BoundScope`
//! - `binder` — name resolution, type checking, constant folding, bound tree
//! - `lowerer` — goto-based control-flow desugaring
//! - `cfg` — basic blocks and the `all_paths_return` analysis
//! - `options` — switches that affect lowering (`CompilerOptions`)
//!
//! `Compilation` ties the pipeline together: lex → parse → bind → lower →
//! analyze, one call per source set, optionally chained onto a `previous`
//! compilation's declarations (spec.md §4.3).

pub mod binder;
pub mod cfg;
pub mod lowerer;
pub mod options;
pub mod symbols;
pub mod syntax;

use std::collections::HashMap;
use std::sync::OnceLock;

use ferrum_core::{DiagnosticBag, SourceText, TextLocation};

use binder::{bind_global_scope, bind_program, GlobalBindResult, Unit};
use lowerer::{lower_body, LoweredBlock};
use syntax::{Parser, SyntaxNodeData, SyntaxTree};

pub use options::CompilerOptions;
pub use symbols::{ClassId, FunctionId, SymbolTable};

/// Where the `rnd` builtin's process-global RNG state would live for the
/// external emitter (spec.md §9's design note). The compiler never reads
/// or seeds this itself — it only models the global's existence, the way
/// spec.md §6 gives `rnd` a signature with no implementation.
pub static RND_SEED: OnceLock<u64> = OnceLock::new();

/// What a successful compilation hands the (external) emitter: every
/// function's lowered body, keyed by `FunctionId` rather than
/// `FunctionSymbol` to match the arena-id convention the rest of the
/// pipeline uses for cyclic structures. Empty — actually absent, via
/// `Compilation::emit` returning `None` — once any diagnostic is an error
/// (spec.md §7).
pub struct EmitResult {
    pub main_function: FunctionId,
    pub functions: HashMap<FunctionId, LoweredBlock>,
}

/// One compiled unit of Ferrum source: an ordered list of trees bound,
/// lowered, and analyzed together. For a REPL or multi-file build, build
/// a fresh `Compilation` per increment and pass the last one as
/// `previous` — its declarations chain underneath the new trees' scope
/// (spec.md §4.3) without re-binding them.
pub struct Compilation {
    pub diagnostics: DiagnosticBag,
    pub symbols: SymbolTable,
    global: GlobalBindResult,
    lowered: HashMap<FunctionId, LoweredBlock>,
}

impl Compilation {
    pub fn compile(sources: Vec<SourceText>) -> Self {
        Self::compile_with(None, sources, CompilerOptions::default())
    }

    pub fn compile_with(previous: Option<&Compilation>, sources: Vec<SourceText>, options: CompilerOptions) -> Self {
        let mut diagnostics = DiagnosticBag::new();
        let trees: Vec<SyntaxTree> = sources.iter().map(|source| Parser::parse(source, &mut diagnostics)).collect();
        let units: Vec<Unit> =
            sources.iter().zip(trees.iter()).map(|(source, tree)| Unit::new(tree, source)).collect();

        let mut symbols = previous.map(|p| p.symbols.clone()).unwrap_or_default();
        let previous_scope = previous.map(|p| &p.global.scope);
        let global = bind_global_scope(previous_scope, &mut symbols, &units, &mut diagnostics);
        let program = bind_program(&global, &mut symbols, &units, &mut diagnostics);

        let locations = locate_functions(&global, &symbols, &units);
        let fallback_location =
            units.first().map(|unit| TextLocation::new(unit.source.clone(), unit.tree.span(unit.tree.root())));

        let mut lowered = HashMap::new();
        for (id, body) in program.bodies {
            let return_type = symbols.function(id).return_type;
            let location = locations
                .get(&id)
                .cloned()
                .or_else(|| fallback_location.clone())
                .expect("a compilation that bound at least one body parsed at least one unit");
            let block = lower_body(body, &options);
            cfg::analyze(&block, return_type, location, &mut diagnostics);
            lowered.insert(id, block);
        }

        Self { diagnostics, symbols, global, lowered }
    }

    pub fn main_function(&self) -> FunctionId {
        self.global.main_function
    }

    /// Declared classes and top-level functions, for callers (tests, a
    /// future emitter) that need to resolve a name back to its id.
    pub fn global_scope(&self) -> &symbols::scope::BoundGlobalScope {
        &self.global.scope
    }

    /// Gated per spec.md §7: once any diagnostic is an error, emission
    /// produces nothing rather than a partial program.
    pub fn emit(self) -> Option<EmitResult> {
        if self.diagnostics.has_errors() {
            return None;
        }
        Some(EmitResult { main_function: self.global.main_function, functions: self.lowered })
    }
}

/// Maps every bound `FunctionId` back to the source span its declaration
/// (or, for a synthesized constructor, its owning class's declaration)
/// came from — bound statements carry no span themselves (see
/// `binder::bound_tree`'s doc comment), so this is built once, directly
/// from the syntax trees, for the benefit of `cfg::analyze`'s
/// diagnostics.
fn locate_functions(global: &GlobalBindResult, symbols: &SymbolTable, units: &[Unit]) -> HashMap<FunctionId, TextLocation> {
    let mut locations = HashMap::new();
    for unit in units {
        let SyntaxNodeData::CompilationUnit { members, .. } = unit.tree.data(unit.tree.root()) else { continue };
        for &member in members {
            match unit.tree.data(member) {
                SyntaxNodeData::FunctionDeclaration { identifier, .. } => {
                    let name = identifier.text(unit.source).to_string();
                    if let Some(&id) = global.scope.functions.get(&name) {
                        locations.insert(id, TextLocation::new(unit.source.clone(), identifier.span));
                    }
                }
                SyntaxNodeData::ClassDeclaration { identifier: class_identifier, members: class_members, .. } => {
                    let class_name = class_identifier.text(unit.source).to_string();
                    let Some(&class_id) = global.scope.classes.get(&class_name) else { continue };
                    let class_location = TextLocation::new(unit.source.clone(), class_identifier.span);

                    let class = symbols.class(class_id);
                    locations.insert(class.default_ctor, class_location.clone());
                    if let Some(full_ctor) = class.full_ctor {
                        locations.insert(full_ctor, class_location.clone());
                    }

                    for &class_member in class_members {
                        if let SyntaxNodeData::FunctionDeclaration { identifier, .. } = unit.tree.data(class_member) {
                            let method_name = identifier.text(unit.source).to_string();
                            let qualified = format!("{class_name}.{method_name}");
                            if let Some(&id) = global.scope.functions.get(&qualified) {
                                locations.insert(id, TextLocation::new(unit.source.clone(), identifier.span));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    locations
}
