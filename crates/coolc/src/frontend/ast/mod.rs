//! Cool AST definitions

mod class;
mod dump;
mod expr;

pub use class::*;
pub use dump::dump_program;
pub use expr::*;

/// A complete Cool program: the classes of every input file
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

impl Program {
    pub fn new(classes: Vec<ClassDecl>) -> Self {
        Self { classes }
    }

    /// Append the classes of another parsed file
    pub fn extend(&mut self, other: Program) {
        self.classes.extend(other.classes);
    }
}
