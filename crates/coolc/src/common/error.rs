//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream, WriteColor};
use std::collections::HashMap;
use thiserror::Error;
use super::Span;

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at line {}: {message}", .span.line)]
    Lexer { message: String, span: Span },

    #[error("Parser error at line {}: {message}", .span.line)]
    Parser { message: String, span: Span },

    #[error("Compilation halted due to static semantic errors.")]
    Semantic { count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(count: usize) -> Self {
        Self::Semantic { count }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// How diagnostics are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// One `<file>:<line>: <message>` line per diagnostic
    #[default]
    Plain,
    /// Labelled source snippets
    Rich,
}

/// Diagnostic reporter for error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    ids: HashMap<String, usize>,
    config: term::Config,
    style: OutputStyle,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self::with_style(OutputStyle::default())
    }

    pub fn with_style(style: OutputStyle) -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: HashMap::new(),
            config: term::Config::default(),
            style,
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        let name = name.into();
        let id = self.files.add(name.clone(), source.into());
        self.ids.insert(name, id);
        id
    }

    /// Id of a previously added file, by name
    pub fn file_id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    /// Convert a front-end error into a renderable diagnostic
    pub fn error_diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Semantic { count } => Diagnostic::error()
                .with_message(error.to_string())
                .with_notes(vec![format!("{} error(s) reported", count)]),

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {}", err))
            }
        }
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = Self::error_diagnostic(file_id, error);
        let plain = match error {
            CompileError::Lexer { message, span } | CompileError::Parser { message, span } => {
                let name = self.files.get(file_id).map(|f| f.name().clone()).unwrap_or_default();
                format!("{}:{}: {}", name, span.line, message)
            }
            other => other.to_string(),
        };
        self.emit(&diagnostic, &plain);
    }

    /// Print one diagnostic to stderr in the configured style
    ///
    /// `plain` is the single-line rendering used by [`OutputStyle::Plain`].
    pub fn emit(&self, diagnostic: &Diagnostic<usize>, plain: &str) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let mut lock = writer.lock();
        let _ = self.write_to(&mut lock, diagnostic, plain);
    }

    /// Render a diagnostic without colors
    pub fn render(&self, diagnostic: &Diagnostic<usize>, plain: &str) -> String {
        let mut buffer = Buffer::no_color();
        let _ = self.write_to(&mut buffer, diagnostic, plain);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    fn write_to(
        &self,
        out: &mut dyn WriteColor,
        diagnostic: &Diagnostic<usize>,
        plain: &str,
    ) -> std::io::Result<()> {
        match self.style {
            OutputStyle::Plain => writeln!(out, "{}", plain),
            OutputStyle::Rich => term::emit(out, &self.config, &self.files, diagnostic)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string())),
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_parser_error() {
        let mut reporter = DiagnosticReporter::new();
        let id = reporter.add_file("a.cl", "class A {");
        let err = CompileError::parser("expected '}', found end of file", Span::new(9, 9, 1));
        let diagnostic = DiagnosticReporter::error_diagnostic(id, &err);
        let out = reporter.render(&diagnostic, "a.cl:1: expected '}', found end of file");
        assert_eq!(out, "a.cl:1: expected '}', found end of file\n");
    }

    #[test]
    fn test_rich_rendering_mentions_file() {
        let mut reporter = DiagnosticReporter::with_style(OutputStyle::Rich);
        let id = reporter.add_file("b.cl", "class B inherits Int {};\n");
        assert_eq!(reporter.file_id("b.cl"), Some(id));
        let diagnostic = Diagnostic::error()
            .with_message("Class B cannot inherit class Int.")
            .with_labels(vec![Label::primary(id, 0..5)]);
        let out = reporter.render(&diagnostic, "");
        assert!(out.contains("Class B cannot inherit class Int."));
        assert!(out.contains("b.cl"));
    }

    #[test]
    fn test_semantic_halt_renders_plain() {
        let reporter = DiagnosticReporter::new();
        let err = CompileError::semantic(3);
        let diagnostic = DiagnosticReporter::error_diagnostic(0, &err);
        assert_eq!(
            reporter.render(&diagnostic, &err.to_string()),
            "Compilation halted due to static semantic errors.\n"
        );
    }
}
