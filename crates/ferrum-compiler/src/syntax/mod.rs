//! Lexical and syntactic front end: tokens, trivia, the arena-based
//! syntax tree, and the recursive-descent/Pratt parser that builds it.

pub mod facts;
pub mod kind;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod tree;

pub use kind::SyntaxKind;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{NumberValue, SyntaxToken, SyntaxTrivia, TokenValue, TriviaKind};
pub use tree::{NodeId, SyntaxNodeData, SyntaxTree};
