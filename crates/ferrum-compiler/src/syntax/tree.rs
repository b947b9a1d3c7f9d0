//! The syntax tree: a flat arena of nodes addressed by `NodeId`, in place
//! of a `rowan` green/red CST. spec.md's redesign notes ask for a tagged
//! union plus index-handle children rather than virtual dispatch over a
//! class hierarchy — `SyntaxNodeData` is that union, one variant per
//! production, and every child node is a `NodeId` into `SyntaxTree::nodes`
//! rather than an owned pointer. Traversal (pretty-printing, the binder)
//! walks by looking nodes up in the arena, the same way the teacher's
//! `plotnik-lib/src/graph` walks its own arena-backed graph rather than a
//! pointer tree.

use ferrum_core::TextSpan;

use super::kind::SyntaxKind;
use super::token::SyntaxToken;

/// Index into `SyntaxTree::nodes`. Cheap to copy, cheap to store as a
/// child reference; never dangles because the arena never removes nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parser-built list of nodes interleaved with their separator tokens
/// (commas), e.g. a parameter list or call-argument list.
#[derive(Debug, Clone, Default)]
pub struct SeparatedSyntaxList {
    pub nodes: Vec<NodeId>,
    pub separators: Vec<SyntaxToken>,
}

impl SeparatedSyntaxList {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

/// One production per `SyntaxKind` node variant. Token fields are owned
/// inline (trivia and all); node fields are `NodeId`s resolved through
/// the owning `SyntaxTree`.
#[derive(Debug, Clone)]
pub enum SyntaxNodeData {
    CompilationUnit {
        members: Vec<NodeId>,
        end_of_file: SyntaxToken,
    },
    FunctionDeclaration {
        keyword: SyntaxToken,
        identifier: SyntaxToken,
        open_paren: SyntaxToken,
        parameters: SeparatedSyntaxList,
        close_paren: SyntaxToken,
        type_clause: Option<NodeId>,
        body: NodeId,
    },
    /// `members` holds a mix of `FieldDeclaration` and `FunctionDeclaration`
    /// node ids — the latter are this class's methods, bound with an
    /// implicit receiver.
    ClassDeclaration {
        keyword: SyntaxToken,
        identifier: SyntaxToken,
        open_brace: SyntaxToken,
        members: Vec<NodeId>,
        close_brace: SyntaxToken,
    },
    FieldDeclaration {
        keyword: SyntaxToken,
        identifier: SyntaxToken,
        type_clause: NodeId,
        semicolon: SyntaxToken,
    },
    GlobalStatement {
        statement: NodeId,
    },
    Parameter {
        identifier: SyntaxToken,
        type_clause: NodeId,
    },
    TypeClause {
        colon: SyntaxToken,
        type_token: SyntaxToken,
    },

    BlockStatement {
        open_brace: SyntaxToken,
        statements: Vec<NodeId>,
        close_brace: SyntaxToken,
    },
    VariableDeclaration {
        keyword: SyntaxToken,
        identifier: SyntaxToken,
        type_clause: Option<NodeId>,
        equals: SyntaxToken,
        initializer: NodeId,
        semicolon: SyntaxToken,
    },
    IfStatement {
        keyword: SyntaxToken,
        condition: NodeId,
        then_statement: NodeId,
        else_clause: Option<NodeId>,
    },
    ElseClause {
        keyword: SyntaxToken,
        else_statement: NodeId,
    },
    WhileStatement {
        keyword: SyntaxToken,
        condition: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        do_keyword: SyntaxToken,
        body: NodeId,
        while_keyword: SyntaxToken,
        condition: NodeId,
        semicolon: SyntaxToken,
    },
    ForStatement {
        keyword: SyntaxToken,
        open_paren: SyntaxToken,
        initializer: NodeId,
        condition: NodeId,
        semicolon: SyntaxToken,
        increment: NodeId,
        close_paren: SyntaxToken,
        body: NodeId,
    },
    BreakStatement {
        keyword: SyntaxToken,
        semicolon: SyntaxToken,
    },
    ContinueStatement {
        keyword: SyntaxToken,
        semicolon: SyntaxToken,
    },
    ReturnStatement {
        keyword: SyntaxToken,
        expression: Option<NodeId>,
        semicolon: SyntaxToken,
    },
    ExpressionStatement {
        expression: NodeId,
        semicolon: SyntaxToken,
    },

    LiteralExpression {
        literal_token: SyntaxToken,
    },
    NameExpression {
        identifier: SyntaxToken,
    },
    ParenthesizedExpression {
        open_paren: SyntaxToken,
        expression: NodeId,
        close_paren: SyntaxToken,
    },
    AssignmentExpression {
        identifier: SyntaxToken,
        equals: SyntaxToken,
        expression: NodeId,
    },
    CompoundAssignmentExpression {
        identifier: SyntaxToken,
        operator: SyntaxToken,
        expression: NodeId,
    },
    FieldAssignmentExpression {
        receiver: NodeId,
        dot: SyntaxToken,
        identifier: SyntaxToken,
        equals: SyntaxToken,
        expression: NodeId,
    },
    CompoundFieldAssignmentExpression {
        receiver: NodeId,
        dot: SyntaxToken,
        identifier: SyntaxToken,
        operator: SyntaxToken,
        expression: NodeId,
    },
    UnaryExpression {
        operator: SyntaxToken,
        operand: NodeId,
    },
    BinaryExpression {
        left: NodeId,
        operator: SyntaxToken,
        right: NodeId,
    },
    /// `callee` is a `NameExpression` (plain call) or `MemberAccessExpression`
    /// (method call) — never an arbitrary expression, matching spec.md's
    /// call-binding rule that the callee is always a name or member access.
    CallExpression {
        callee: NodeId,
        open_paren: SyntaxToken,
        arguments: SeparatedSyntaxList,
        close_paren: SyntaxToken,
    },
    MemberAccessExpression {
        receiver: NodeId,
        dot: SyntaxToken,
        identifier: SyntaxToken,
    },
}

struct NodeRecord {
    kind: SyntaxKind,
    span: TextSpan,
    data: SyntaxNodeData,
}

/// The arena itself. Built bottom-up by the parser: a node can only
/// reference `NodeId`s allocated before it, so the tree is always a DAG
/// with `root` as the unique sink in practice (a tree, since nothing is
/// ever shared between parents).
pub struct SyntaxTree {
    nodes: Vec<NodeRecord>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    pub fn data(&self, id: NodeId) -> &SyntaxNodeData {
        &self.nodes[id.index()].data
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Generic children accessor used by pretty-printers and any pass
    /// that wants structural recursion without a match over every
    /// variant (the binder matches explicitly instead, since it needs
    /// per-kind semantics, but diagnostics/debug dumps use this).
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        use SyntaxNodeData::*;
        match &self.nodes[id.index()].data {
            CompilationUnit { members, .. } => members.clone(),
            FunctionDeclaration { parameters, type_clause, body, .. } => {
                let mut out = parameters.nodes.clone();
                out.extend(type_clause.iter().copied());
                out.push(*body);
                out
            }
            ClassDeclaration { members, .. } => members.clone(),
            FieldDeclaration { type_clause, .. } => vec![*type_clause],
            GlobalStatement { statement } => vec![*statement],
            Parameter { type_clause, .. } => vec![*type_clause],
            TypeClause { .. } => vec![],
            BlockStatement { statements, .. } => statements.clone(),
            VariableDeclaration { type_clause, initializer, .. } => {
                let mut out: Vec<NodeId> = type_clause.iter().copied().collect();
                out.push(*initializer);
                out
            }
            IfStatement { condition, then_statement, else_clause, .. } => {
                let mut out = vec![*condition, *then_statement];
                out.extend(else_clause.iter().copied());
                out
            }
            ElseClause { else_statement, .. } => vec![*else_statement],
            WhileStatement { condition, body, .. } => vec![*condition, *body],
            DoWhileStatement { body, condition, .. } => vec![*body, *condition],
            ForStatement { initializer, condition, increment, body, .. } => {
                vec![*initializer, *condition, *increment, *body]
            }
            BreakStatement { .. } | ContinueStatement { .. } => vec![],
            ReturnStatement { expression, .. } => expression.iter().copied().collect(),
            ExpressionStatement { expression, .. } => vec![*expression],
            LiteralExpression { .. } | NameExpression { .. } => vec![],
            ParenthesizedExpression { expression, .. } => vec![*expression],
            AssignmentExpression { expression, .. } => vec![*expression],
            CompoundAssignmentExpression { expression, .. } => vec![*expression],
            FieldAssignmentExpression { receiver, expression, .. } => vec![*receiver, *expression],
            CompoundFieldAssignmentExpression { receiver, expression, .. } => vec![*receiver, *expression],
            UnaryExpression { operand, .. } => vec![*operand],
            BinaryExpression { left, right, .. } => vec![*left, *right],
            CallExpression { callee, arguments, .. } => {
                let mut out = vec![*callee];
                out.extend(arguments.nodes.iter().copied());
                out
            }
            MemberAccessExpression { receiver, .. } => vec![*receiver],
        }
    }
}

/// Builds a `SyntaxTree` bottom-up: every `push` allocates the next
/// `NodeId`, so children are always pushed before their parent.
pub struct SyntaxTreeBuilder {
    nodes: Vec<NodeRecord>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, kind: SyntaxKind, span: TextSpan, data: SyntaxNodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeRecord { kind, span, data });
        id
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes, root }
    }
}

impl Default for SyntaxTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
