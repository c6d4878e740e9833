//! Reader for the small XML dialect function documents are saved in.

pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod parser;

pub use error::MarkupError;
