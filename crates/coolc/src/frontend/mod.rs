//! Cool front end
//!
//! The front end is responsible for:
//! 1. Lexing source code into tokens
//! 2. Parsing tokens into an AST
//! 3. Performing semantic analysis over the merged program

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

pub use lexer::CoolLexer;
pub use parser::CoolParser;
pub use sema::{Analysis, Analyzer, SemantConfig};

use crate::common::{CompileResult, DiagnosticReporter};
use ast::Program;
use tracing::info;

/// Configuration options passed to the front end
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub verbose: bool,
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// Cool language front end
#[derive(Debug, Default)]
pub struct CoolFrontend;

impl CoolFrontend {
    pub fn new() -> Self {
        Self
    }

    /// Lex and parse one source file
    ///
    /// Lexer and parser errors are fatal: the first one is reported through
    /// the context's reporter and returned.
    pub fn parse(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<Program> {
        // Phase 1: Lexing (optional token dump)
        if config.dump_tokens {
            match self.dump_tokens(source) {
                Ok(tokens) => {
                    eprintln!("=== Cool Tokens: {} ===", ctx.filename);
                    eprint!("{}", tokens);
                    eprintln!("=== End Tokens ===\n");
                }
                Err(e) => {
                    ctx.reporter.report_error(ctx.file_id, &e);
                    return Err(e);
                }
            }
        }

        // Phase 2: Parsing
        if config.verbose {
            info!(file = %ctx.filename, "parsing");
        }

        let mut parser = CoolParser::new(source, ctx.filename.clone());
        let program = match parser.parse_program() {
            Ok(p) => p,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(e);
            }
        };

        if config.dump_ast {
            eprintln!("=== Cool AST: {} ===", ctx.filename);
            eprintln!("{:#?}", program);
            eprintln!("=== End AST ===\n");
        }

        Ok(program)
    }

    /// One token per line with its source line
    pub fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let lexer = CoolLexer::new(source);
        let tokens = lexer.tokenize_all()?;
        let mut output = String::new();
        for token in &tokens {
            output.push_str(&format!("#{} {}\n", token.span.line, token.kind));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_tokens_lists_lines() {
        let out = CoolFrontend::new().dump_tokens("class\nMain").unwrap();
        assert_eq!(out, "#1 class\n#2 type identifier 'Main'\n#2 end of file\n");
    }

    #[test]
    fn test_parse_reports_file_name() {
        let mut reporter = DiagnosticReporter::new();
        let id = reporter.add_file("x.cl", "class A { };");
        let ctx = CompileContext::new("x.cl".into(), id, &reporter);
        let program = CoolFrontend::new()
            .parse("class A { };", &ctx, &FrontendConfig::default())
            .unwrap();
        assert_eq!(program.classes[0].file, "x.cl");
    }
}
