//! Cool lexer module

mod token;
mod scanner;

pub use token::{CoolToken, CoolTokenKind};
pub use scanner::CoolLexer;
