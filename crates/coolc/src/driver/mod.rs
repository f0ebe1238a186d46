//! Compilation driver and pipeline orchestration

use crate::common::{CompileResult, DiagnosticReporter, OutputStyle};
use crate::frontend::ast::Program;
use crate::frontend::{Analysis, Analyzer, CompileContext, CoolFrontend, FrontendConfig, SemantConfig};
use tracing::{debug, info};

/// One input file held in memory
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), source: source.into() }
    }
}

/// Output of a pipeline run
#[derive(Debug)]
pub struct Compilation {
    /// The merged, type-annotated program
    pub program: Program,
    pub analysis: Analysis,
}

/// Compilation pipeline: parse every file, merge, analyze
pub struct Pipeline {
    frontend: CoolFrontend,
    frontend_config: FrontendConfig,
    analyzer: Analyzer,
}

impl Pipeline {
    pub fn new(frontend_config: FrontendConfig, semant_config: SemantConfig) -> Self {
        Self {
            frontend: CoolFrontend::new(),
            frontend_config,
            analyzer: Analyzer::new(semant_config),
        }
    }

    /// Parse each file and merge their classes in input order
    ///
    /// Every file is registered with `reporter` so later diagnostics can
    /// point into it. Stops at the first lexer or parser error.
    pub fn parse_files(
        &self,
        files: &[SourceFile],
        reporter: &mut DiagnosticReporter,
    ) -> CompileResult<Program> {
        for file in files {
            reporter.add_file(file.name.clone(), file.source.clone());
        }

        let mut program = Program::default();
        for file in files {
            let file_id = reporter.file_id(&file.name).unwrap_or_default();
            let ctx = CompileContext::new(file.name.clone(), file_id, reporter);
            let parsed = self.frontend.parse(&file.source, &ctx, &self.frontend_config)?;
            debug!(file = %file.name, classes = parsed.classes.len(), "parsed");
            program.extend(parsed);
        }
        Ok(program)
    }

    /// Run semantic analysis over an already parsed program
    pub fn analyze(&self, program: &mut Program) -> Analysis {
        let analysis = self.analyzer.analyze(program);
        info!(
            classes = program.classes.len(),
            errors = analysis.error_count(),
            "semantic analysis finished"
        );
        analysis
    }

    /// Parse and analyze a set of source files
    pub fn compile_sources(
        &self,
        files: &[SourceFile],
        reporter: &mut DiagnosticReporter,
    ) -> CompileResult<Compilation> {
        let mut program = self.parse_files(files, reporter)?;
        let analysis = self.analyze(&mut program);
        Ok(Compilation { program, analysis })
    }

    /// Print every diagnostic of `analysis` to stderr
    pub fn report(&self, analysis: &Analysis, reporter: &DiagnosticReporter) {
        for diagnostic in &analysis.diagnostics {
            let file_id = match reporter.style() {
                OutputStyle::Rich => diagnostic.file().and_then(|f| reporter.file_id(f)),
                OutputStyle::Plain => None,
            };
            reporter.emit(&diagnostic.to_codespan(file_id), &diagnostic.to_string());
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FrontendConfig::default(), SemantConfig::default())
    }
}
