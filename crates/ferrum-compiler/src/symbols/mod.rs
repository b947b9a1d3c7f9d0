//! Symbol types and the global symbol arenas (`ClassId`/`FunctionId`).
//!
//! Classes and functions are given stable integer identities in
//! per-compilation arenas rather than being linked by pointer, so that
//! cyclic structures — a function's `overload_for` chain pointing back
//! through earlier overloads, a method's `receiver` pointing at its
//! owning class — never need `Rc`/`RefCell`. This is the "index-handle
//! children instead of pointer cycles" shape spec.md's redesign notes
//! ask for.

pub mod scope;

use std::fmt;

/// Index into `SymbolTable::classes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Index into `SymbolTable::functions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// A Ferrum type. `Class` carries the defining class's id rather than a
/// name, so two classes can never be confused once bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSymbol {
    Error,
    Void,
    Object,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Float128,
    Char,
    String,
    Class(ClassId),
}

impl TypeSymbol {
    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, TypeSymbol::Float32 | TypeSymbol::Float64 | TypeSymbol::Float128)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeSymbol::Int8
                | TypeSymbol::Int16
                | TypeSymbol::Int32
                | TypeSymbol::Int64
                | TypeSymbol::UInt8
                | TypeSymbol::UInt16
                | TypeSymbol::UInt32
                | TypeSymbol::UInt64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            TypeSymbol::Int8
                | TypeSymbol::Int16
                | TypeSymbol::Int32
                | TypeSymbol::Int64
                | TypeSymbol::Float32
                | TypeSymbol::Float64
                | TypeSymbol::Float128
        )
    }

    /// Bit width for integer types, used to rank implicit widening.
    pub fn integer_rank(self) -> Option<u8> {
        Some(match self {
            TypeSymbol::Int8 | TypeSymbol::UInt8 => 8,
            TypeSymbol::Int16 | TypeSymbol::UInt16 => 16,
            TypeSymbol::Int32 | TypeSymbol::UInt32 => 32,
            TypeSymbol::Int64 | TypeSymbol::UInt64 => 64,
            _ => return None,
        })
    }

    pub fn float_rank(self) -> Option<u8> {
        Some(match self {
            TypeSymbol::Float32 => 32,
            TypeSymbol::Float64 => 64,
            TypeSymbol::Float128 => 128,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeSymbol::Error => "?",
            TypeSymbol::Void => "void",
            TypeSymbol::Object => "object",
            TypeSymbol::Bool => "bool",
            TypeSymbol::Int8 => "int8",
            TypeSymbol::Int16 => "int16",
            TypeSymbol::Int32 => "int32",
            TypeSymbol::Int64 => "int64",
            TypeSymbol::UInt8 => "uint8",
            TypeSymbol::UInt16 => "uint16",
            TypeSymbol::UInt32 => "uint32",
            TypeSymbol::UInt64 => "uint64",
            TypeSymbol::Float32 => "float32",
            TypeSymbol::Float64 => "float64",
            TypeSymbol::Float128 => "float128",
            TypeSymbol::Char => "char",
            TypeSymbol::String => "string",
            TypeSymbol::Class(_) => "class",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Global,
    Local,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: TypeSymbol,
    pub is_read_only: bool,
    pub kind: VariableKind,
}

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub name: String,
    pub ty: TypeSymbol,
    pub is_const: bool,
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: String,
    pub fields: Vec<FieldSymbol>,
    /// The synthesized zero-argument constructor (default-initializes
    /// every field).
    pub default_ctor: FunctionId,
    /// The synthesized full-argument constructor, present only when the
    /// class has at least one writable (non-`const`) field — a class with
    /// zero writable fields would otherwise declare two identical
    /// zero-arity overloads.
    pub full_ctor: Option<FunctionId>,
}

impl ClassSymbol {
    pub fn writable_fields(&self) -> impl Iterator<Item = &FieldSymbol> {
        self.fields.iter().filter(|f| !f.is_const)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub parameters: Vec<VariableSymbol>,
    pub return_type: TypeSymbol,
    /// Set for a method bound with an implicit leading `this`.
    pub receiver: Option<ClassId>,
    /// Previous declaration sharing this name, if this is not the first;
    /// overload resolution walks this chain first-match-wins.
    pub overload_for: Option<FunctionId>,
    pub is_builtin: bool,
}

impl FunctionSymbol {
    pub fn is_constructor(&self) -> bool {
        self.name.ends_with(".ctor")
    }
}

/// Owns every class and function allocated in a compilation, addressed
/// by `ClassId`/`FunctionId`. Grows monotonically; nothing is ever
/// removed, so ids never dangle.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    classes: Vec<ClassSymbol>,
    functions: Vec<FunctionSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_class(&mut self, class: ClassSymbol) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn alloc_function(&mut self, function: FunctionSymbol) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassSymbol {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassSymbol {
        &mut self.classes[id.0 as usize]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionSymbol {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionSymbol {
        &mut self.functions[id.0 as usize]
    }

    /// Walks an overload chain starting at `head`, yielding the head
    /// first then each earlier declaration in turn.
    pub fn overload_chain(&self, head: FunctionId) -> impl Iterator<Item = (FunctionId, &FunctionSymbol)> {
        let mut current = Some(head);
        std::iter::from_fn(move || {
            let id = current?;
            let symbol = self.function(id);
            current = symbol.overload_for;
            Some((id, symbol))
        })
    }

    pub fn type_name(&self, ty: TypeSymbol) -> String {
        match ty {
            TypeSymbol::Class(id) => self.class(id).name.clone(),
            other => other.to_string(),
        }
    }
}
