//! Cool parser module

mod parser;

pub use parser::CoolParser;
