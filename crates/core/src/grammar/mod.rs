/// Compiled grammar types.
pub mod ast;
/// Grammar-template lexer: splits a template into words and group delimiters.
pub mod lexer;
/// Grammar-template parser: builds a [`ast::Grammar`] from tokens.
pub mod parser;
