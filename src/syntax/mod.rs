//! Rust source model: lexing, parsing, comment attachment and printing
//!
//! The grammar covers module-level items and their signatures. Function
//! bodies, initializers, generic parameter lists and attributes are kept as
//! token regions whose identifiers remain addressable, which is all the
//! substitution pass needs.

pub mod ast;
mod comments;
mod grammar;
pub mod lexer;
mod printer;

pub use ast::*;
pub use grammar::parse;
pub(crate) use printer::fingerprint;
pub use printer::{render_type, serialize, to_source, SerializeError};
