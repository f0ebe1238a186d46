//! Semantic diagnostics and the capped collector

use crate::common::Span;
use codespan_reporting::diagnostic::{Diagnostic as Report, Label, Severity};
use std::fmt;

/// Which analysis tier produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Class hierarchy defects: duplicate or reserved names, bad parents,
    /// cycles, missing entry point
    Structural,
    /// Feature declaration defects: duplicates, bad overrides, unknown types
    Declaration,
    /// Expression typing defects
    Type,
}

/// Source position of a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub span: Span,
}

/// One semantic error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `None` for program-wide conditions such as a missing `Main`
    pub location: Option<Location>,
    pub message: String,
    pub kind: ErrorKind,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
            kind,
            severity: Severity::Error,
        }
    }

    pub fn at(mut self, file: impl Into<String>, span: Span) -> Self {
        self.location = Some(Location { file: file.into(), span });
        self
    }

    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }

    pub fn line(&self) -> Option<u32> {
        self.location.as_ref().map(|l| l.span.line)
    }

    /// Convert to a `codespan-reporting` diagnostic for rich rendering
    ///
    /// `file_id` is the reporter's id for [`Diagnostic::file`]; built-in
    /// classes and unlocated diagnostics have none and render without a label.
    pub fn to_codespan(&self, file_id: Option<usize>) -> Report<usize> {
        let report = Report::new(self.severity).with_message(&self.message);
        match (file_id, &self.location) {
            (Some(id), Some(location)) => report.with_labels(vec![Label::primary(
                id,
                location.span.start..location.span.end,
            )]),
            _ => report,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => {
                write!(f, "{}:{}: {}", location.file, location.span.line, self.message)
            }
            None => write!(f, "{}", self.message),
        }
    }
}

/// Append-only diagnostic collector with an optional error cap
///
/// Once more than `max_errors` diagnostics are recorded the collector is
/// halted: later diagnostics are dropped and the passes stop early.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    max_errors: Option<usize>,
}

impl Diagnostics {
    pub fn new(max_errors: Option<usize>) -> Self {
        Self { entries: Vec::new(), max_errors }
    }

    /// Collector without a cap, used for per-class buffers
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.halted() {
            return;
        }
        tracing::trace!(%diagnostic, "recorded diagnostic");
        self.entries.push(diagnostic);
    }

    /// Record an error at a source location
    pub fn report(&mut self, kind: ErrorKind, file: &str, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::error(kind, message).at(file, span));
    }

    /// Move every buffered diagnostic of `other` into this collector
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.push(diagnostic);
        }
    }

    pub fn halted(&self) -> bool {
        self.max_errors.is_some_and(|max| self.entries.len() > max)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
