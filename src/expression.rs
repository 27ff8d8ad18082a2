pub mod ast;
pub(crate) mod lexer;
pub mod parser;
