//! `BoundScope`: the parent-linked variable scope tree, plus the
//! top-level class/function namespace and built-in seeding.

use indexmap::IndexMap;

use super::{ClassId, FunctionId, FunctionSymbol, SymbolTable, TypeSymbol, VariableKind, VariableSymbol};

/// A single lexical scope's variable map, linked to its parent. Classes
/// and functions live one level up, in `BoundGlobalScope` — they are
/// never block-scoped.
#[derive(Debug, Clone, Default)]
pub struct BoundScope {
    parent: Option<Box<BoundScope>>,
    variables: IndexMap<String, VariableSymbol>,
}

impl BoundScope {
    pub fn new(parent: Option<Box<BoundScope>>) -> Self {
        Self { parent, variables: IndexMap::new() }
    }

    /// Consumes this scope and returns its parent, re-establishing the
    /// binder's cursor one level up. Mirrors entering/leaving a block in
    /// the binder: `scope = BoundScope::new(Some(Box::new(scope)))` on
    /// entry, `scope = *scope.pop().unwrap()` on exit.
    pub fn pop(self) -> Option<Box<BoundScope>> {
        self.parent
    }

    /// Declares `variable` in *this* scope only. Fails (returns `false`,
    /// declares nothing) if the name already exists in this scope —
    /// shadowing an outer scope's variable is allowed.
    pub fn try_declare(&mut self, variable: VariableSymbol) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }
        self.variables.insert(variable.name.clone(), variable);
        true
    }

    pub fn try_lookup(&self, name: &str) -> Option<&VariableSymbol> {
        if let Some(found) = self.variables.get(name) {
            return Some(found);
        }
        self.parent.as_ref().and_then(|p| p.try_lookup(name))
    }
}

/// The namespace of classes and functions visible to every tree in a
/// compilation, plus the root variable scope (global variables live
/// here too, since a script's global statements share one implicit
/// scope).
pub struct BoundGlobalScope {
    pub root: BoundScope,
    pub classes: IndexMap<String, ClassId>,
    /// Name → head of its overload chain. A second declaration under the
    /// same name replaces the head and links back via `overload_for`.
    pub functions: IndexMap<String, FunctionId>,
}

impl BoundGlobalScope {
    pub fn new_with_builtins(symbols: &mut SymbolTable) -> Self {
        let mut scope = Self {
            root: BoundScope::new(None),
            classes: IndexMap::new(),
            functions: IndexMap::new(),
        };
        scope.seed_builtins(symbols);
        scope
    }

    /// Chains a fresh global scope under `previous`'s declarations, per
    /// spec.md §4.3: replay classes → functions → variables from the
    /// prior compilation into new layered maps so later trees can see
    /// them without re-binding the old ones.
    pub fn chained_from(previous: &BoundGlobalScope) -> Self {
        let mut scope = Self {
            root: BoundScope::new(None),
            classes: previous.classes.clone(),
            functions: previous.functions.clone(),
        };
        for (name, variable) in previous.root.variables.iter() {
            scope.root.variables.insert(name.clone(), variable.clone());
        }
        scope
    }

    fn seed_builtins(&mut self, symbols: &mut SymbolTable) {
        let mut declare = |name: &str, parameters: Vec<(&str, TypeSymbol)>, return_type: TypeSymbol| {
            let id = symbols.alloc_function(FunctionSymbol {
                name: name.to_string(),
                parameters: parameters
                    .into_iter()
                    .map(|(name, ty)| VariableSymbol {
                        name: name.to_string(),
                        ty,
                        is_read_only: true,
                        kind: VariableKind::Parameter,
                    })
                    .collect(),
                return_type,
                receiver: None,
                overload_for: None,
                is_builtin: true,
            });
            self.functions.insert(name.to_string(), id);
        };

        declare("write", vec![("value", TypeSymbol::Object)], TypeSymbol::Void);
        declare("writeLine", vec![("value", TypeSymbol::Object)], TypeSymbol::Void);
        declare("readLine", vec![], TypeSymbol::String);
        declare("readKey", vec![], TypeSymbol::Char);
        declare("readAllText", vec![("path", TypeSymbol::String)], TypeSymbol::String);
        declare(
            "writeAllText",
            vec![("path", TypeSymbol::String), ("contents", TypeSymbol::String)],
            TypeSymbol::Void,
        );
        declare("rnd", vec![("max", TypeSymbol::Int32)], TypeSymbol::Int32);
    }
}
