//! coolc - semantic analyzer for the Cool teaching language
//!
//! This library lexes and parses Cool programs, validates the class
//! hierarchy and feature declarations, and type-checks every expression,
//! leaving a fully type-annotated tree or a list of semantic errors.
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): lexer, parser, AST and semantic analysis
//! - **Driver** (`driver/`): multi-file pipeline orchestration
//! - **Common** (`common/`): shared infrastructure (errors, spans, reporting)
//! - **Types** (`types/`): static types and well-known names

pub mod common;
pub mod driver;
pub mod frontend;
pub mod types;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, OutputStyle, Span};
pub use driver::{Compilation, Pipeline, SourceFile};
pub use frontend::sema::{Analysis, Analyzer, Diagnostic, ErrorKind, SemantConfig, analyze};
pub use frontend::{CompileContext, CoolFrontend, FrontendConfig};
pub use types::Type;
