//! coolc - semantic analyzer for the Cool teaching language
//!
//! Usage: coolc [OPTIONS] <FILES>...

use anyhow::{Context, Result};
use clap::{ArgAction, Parser as ClapParser, ValueEnum};
use cool_compiler::frontend::ast::dump_program;
use cool_compiler::{
    CompileError, DiagnosticReporter, FrontendConfig, OutputStyle, Pipeline, SemantConfig, SourceFile,
};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Diagnostic output format
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Default)]
enum Format {
    /// One `<file>:<line>: <message>` line per error
    #[default]
    Plain,
    /// Labelled source snippets
    Rich,
}

#[derive(ClapParser, Debug)]
#[command(name = "coolc")]
#[command(version)]
#[command(about = "Semantic analyzer and type checker for Cool", long_about = None)]
struct Args {
    /// Input source files (.cl); their classes form one program
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Stop after this many errors (0 = no limit)
    #[arg(long, default_value = "50")]
    max_errors: usize,

    /// Diagnostic output format
    #[arg(long, value_enum, default_value = "plain")]
    format: Format,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Print the type-annotated program after a successful analysis
    #[arg(long)]
    dump_types: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "coolc=warn,cool_compiler=warn",
        1 => "coolc=info,cool_compiler=info",
        2 => "coolc=debug,cool_compiler=debug",
        _ => "coolc=trace,cool_compiler=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when the program has lexical, syntax or semantic errors
fn run(args: &Args) -> Result<bool> {
    let files = args
        .files
        .iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            Ok(SourceFile::new(path.display().to_string(), source))
        })
        .collect::<Result<Vec<_>>>()?;

    let style = match args.format {
        Format::Plain => OutputStyle::Plain,
        Format::Rich => OutputStyle::Rich,
    };
    let mut reporter = DiagnosticReporter::with_style(style);

    let frontend_config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        verbose: args.verbose > 0,
    };
    let semant_config = SemantConfig {
        max_errors: (args.max_errors > 0).then_some(args.max_errors),
    };
    let pipeline = Pipeline::new(frontend_config, semant_config);

    let Ok(compilation) = pipeline.compile_sources(&files, &mut reporter) else {
        eprintln!("Compilation halted due to lex and parse errors");
        return Ok(false);
    };

    pipeline.report(&compilation.analysis, &reporter);
    if !compilation.analysis.is_ok() {
        let halt = CompileError::semantic(compilation.analysis.error_count());
        reporter.report_error(0, &halt);
        return Ok(false);
    }

    if args.dump_types {
        print!("{}", dump_program(&compilation.program));
    }
    Ok(true)
}
