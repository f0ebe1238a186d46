//! Cool semantic analysis module
//!
//! Passes run strictly in order, each relying on the previous one:
//! 1. [`ClassTable`]: inheritance graph and structural checks
//! 2. [`FeatureTable`]: per-class attributes, methods and overrides
//! 3. [`TypeChecker`]: expression typing and annotation
//!
//! All passes report into one [`Diagnostics`] collector. Once it exceeds
//! the configured error limit the remaining passes are skipped.

mod builtins;
mod checker;
mod class_table;
mod diagnostics;
mod features;
mod lattice;
mod scope;

pub use builtins::{BuiltinClass, BuiltinMethod, BUILTINS, BUILTIN_FILE};
pub use checker::TypeChecker;
pub use class_table::{Ancestors, ClassInfo, ClassOrigin, ClassTable};
pub use diagnostics::{Diagnostic, Diagnostics, ErrorKind, Location};
pub use features::{resolve_type_name, AttrSig, FeatureTable, FormalSig, MethodSig};
pub use lattice::{TypeLattice, UndefinedType};
pub use scope::Scope;

use crate::frontend::ast::Program;
use tracing::{debug, info};

/// Default cap on recorded errors
pub const DEFAULT_MAX_ERRORS: usize = 50;

/// Semantic analysis options
#[derive(Debug, Clone)]
pub struct SemantConfig {
    /// Halt once more than this many errors are recorded; `None` never halts
    pub max_errors: Option<usize>,
}

impl Default for SemantConfig {
    fn default() -> Self {
        Self { max_errors: Some(DEFAULT_MAX_ERRORS) }
    }
}

/// Result of analyzing a program
#[derive(Debug)]
pub struct Analysis {
    pub classes: ClassTable,
    pub features: FeatureTable,
    /// In reporting order
    pub diagnostics: Vec<Diagnostic>,
    /// True if the error limit cut the analysis short
    pub halted: bool,
}

impl Analysis {
    /// No diagnostics: every expression carries its static type
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Semantic analyzer driving the three passes
#[derive(Debug, Default)]
pub struct Analyzer {
    config: SemantConfig,
}

impl Analyzer {
    pub fn new(config: SemantConfig) -> Self {
        Self { config }
    }

    /// Validate `program` and annotate its expressions with static types
    pub fn analyze(&self, program: &mut Program) -> Analysis {
        let mut diagnostics = Diagnostics::new(self.config.max_errors);

        let classes = ClassTable::build(program, &mut diagnostics);
        debug!(errors = diagnostics.len(), "inheritance graph pass done");

        let features = if diagnostics.halted() {
            FeatureTable::default()
        } else {
            let features = FeatureTable::build(program, &classes, &mut diagnostics);
            debug!(errors = diagnostics.len(), "feature pass done");
            features
        };

        if !diagnostics.halted() {
            TypeChecker::new(&classes, &features, &mut diagnostics).check_program(program);
            debug!(errors = diagnostics.len(), "type checking pass done");
        }

        let halted = diagnostics.halted();
        if halted {
            info!(limit = ?self.config.max_errors, "error limit exceeded, analysis halted");
        }

        Analysis {
            classes,
            features,
            diagnostics: diagnostics.into_vec(),
            halted,
        }
    }
}

/// Analyze `program` with the default configuration
pub fn analyze(program: &mut Program) -> Analysis {
    Analyzer::default().analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::CoolParser;
    use pretty_assertions::assert_eq;

    fn run(source: &str, config: SemantConfig) -> Analysis {
        let mut program = CoolParser::new(source, "m.cl").parse_program().unwrap();
        Analyzer::new(config).analyze(&mut program)
    }

    #[test]
    fn test_pass_order_in_diagnostics() {
        let source = "class Main { main() : Object { 1 + true }; x : Nope; };
                      class A inherits Missing { };";
        let analysis = run(source, SemantConfig::default());
        let kinds: Vec<_> = analysis.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Structural, ErrorKind::Declaration, ErrorKind::Type]);
        assert!(!analysis.is_ok());
    }

    #[test]
    fn test_error_limit_halts() {
        let body = (0..10).map(|i| format!("v{};", i)).collect::<String>();
        let source = format!("class Main {{ main() : Object {{ {{ {} }} }}; }};", body);

        let analysis = run(&source, SemantConfig { max_errors: Some(3) });
        assert!(analysis.halted);
        assert_eq!(analysis.error_count(), 4);

        let analysis = run(&source, SemantConfig { max_errors: None });
        assert!(!analysis.halted);
        assert_eq!(analysis.error_count(), 10);
    }

    #[test]
    fn test_structural_limit_skips_later_passes() {
        let source = "class A inherits Int { }; class B inherits Int { }; class Main { x : Nope; main() : Object { 0 }; };";
        let analysis = run(source, SemantConfig { max_errors: Some(1) });
        assert!(analysis.halted);
        assert!(analysis.diagnostics.iter().all(|d| d.kind == ErrorKind::Structural));
        assert!(!analysis.features.has_class("Main"));
    }
}
