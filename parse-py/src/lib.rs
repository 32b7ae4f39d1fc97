pub mod ast;
pub mod emit;
pub mod error;
pub mod lex;
pub mod loc;
pub mod parse;
pub mod token;

pub use crate::parse::parse;
