//! buckle: Run Buckle programs or start a REPL.
//!
//! Usage:
//!   buckle [options] [file...]
//!
//! With no files the REPL starts. Logging is controlled by `BUCKLE_LOG`.

mod repl;
mod report;

use buckle_compiler::Compilation;
use buckle_core::SourceText;
use buckle_diagnostics::DiagnosticQueue;
use buckle_evaluator::Globals;
use buckle_options::{parse_options_file, CompilerOptions, OPTIONS_FILE_NAME};
use clap::Parser as ClapParser;
use report::Reporter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "buckle", about = "buckle - Compiler and interpreter for the Buckle language")]
struct Cli {
    /// Source files to evaluate. Starts the REPL when empty.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Path to an options file. Defaults to ./buckle.json when present.
    #[arg(short = 'o', long = "options")]
    options: Option<String>,

    /// Evaluate files as a script: global statements run in order and the
    /// last expression statement is the result.
    #[arg(long)]
    script: bool,

    /// Print the lowered bound tree.
    #[arg(long = "showTree")]
    show_tree: bool,

    /// Write the entry point's control flow graph as Graphviz DOT.
    #[arg(long = "showCfg")]
    show_cfg: bool,

    /// Where `--showCfg` writes the graph.
    #[arg(long = "cfgPath")]
    cfg_path: Option<String>,

    /// Treat warnings as errors.
    #[arg(long = "warningsAsErrors")]
    warnings_as_errors: bool,

    /// Disable colored output.
    #[arg(long = "noColor")]
    no_color: bool,
}

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERRORS: i32 = 1;
const EXIT_FATAL: i32 = 2;

fn main() {
    init_logging();
    let cli = Cli::parse();

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(message) => {
            Reporter::new(!cli.no_color).print_error(&message);
            process::exit(EXIT_FATAL);
        }
    };

    if cli.files.is_empty() {
        let mut repl = repl::Repl::new(options);
        if let Err(error) = repl.run() {
            repl.reporter().print_error(&format!("failed to read input: {}", error));
            process::exit(EXIT_FATAL);
        }
        return;
    }

    let exit_code = run_files(&cli.files, options);
    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("BUCKLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Options from the options file, overridden by command-line flags.
fn load_options(cli: &Cli) -> Result<CompilerOptions, String> {
    let mut options = match &cli.options {
        Some(path) => parse_options_file(path).map_err(|e| format!("failed to read options '{}': {}", path, e))?,
        None if Path::new(OPTIONS_FILE_NAME).exists() => parse_options_file(OPTIONS_FILE_NAME)
            .map_err(|e| format!("failed to read options '{}': {}", OPTIONS_FILE_NAME, e))?,
        None => CompilerOptions::default(),
    };

    if cli.script {
        options.script = true;
    }
    if cli.show_tree {
        options.show_tree = true;
    }
    if cli.show_cfg {
        options.show_cfg = true;
    }
    if let Some(path) = &cli.cfg_path {
        options.cfg_path = path.clone();
    }
    if cli.warnings_as_errors {
        options.warnings_as_errors = true;
    }
    if cli.no_color {
        options.color = false;
    }

    debug!(?options, "resolved options");
    Ok(options)
}

fn run_files(files: &[String], options: CompilerOptions) -> i32 {
    let start = Instant::now();
    let reporter = Reporter::new(options.color);

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        match std::fs::read_to_string(file) {
            Ok(text) => sources.push(SourceText::new(file, &text)),
            Err(e) => {
                reporter.print_error(&format!("cannot read '{}': {}", file, e));
                return EXIT_FATAL;
            }
        }
    }

    let texts = sources.iter().map(|source| source.text().to_string()).collect();
    let compilation = if options.script {
        Compilation::create_script(None, texts)
    } else {
        Compilation::create(texts)
    }
    .with_options(options.clone());

    if let Err(message) = emit(&compilation, &options) {
        reporter.print_error(&message);
        return EXIT_FATAL;
    }

    let result = match compilation.evaluate(&mut Globals::new()) {
        Ok(result) => result,
        Err(error) => {
            reporter.print_error(&format!("internal compiler error: {}", error));
            return EXIT_FATAL;
        }
    };

    // Spans are per text, so they only resolve to lines for a single file.
    let source = if sources.len() == 1 { sources.first() } else { None };
    reporter.print_diagnostics(&result.diagnostics, source);
    info!(elapsed = ?start.elapsed(), "evaluation finished");

    let code = exit_code(&result.diagnostics, options.warnings_as_errors);
    match failure_count(&result.diagnostics, options.warnings_as_errors) {
        Some(count) => reporter.print_error_count(count),
        None if options.script => {
            if let Some(value) = &result.value {
                reporter.print_value(value);
            }
        }
        None => {}
    }
    code
}

/// Number of diagnostics that fail the run, or `None` when it succeeded.
/// With `warnings_as_errors` every diagnostic counts.
fn failure_count(diagnostics: &DiagnosticQueue, warnings_as_errors: bool) -> Option<usize> {
    if diagnostics.has_errors() {
        Some(diagnostics.error_count())
    } else if warnings_as_errors && !diagnostics.is_empty() {
        Some(diagnostics.len())
    } else {
        None
    }
}

fn exit_code(diagnostics: &DiagnosticQueue, warnings_as_errors: bool) -> i32 {
    if diagnostics.has_fatal() {
        EXIT_FATAL
    } else if failure_count(diagnostics, warnings_as_errors).is_some() {
        EXIT_ERRORS
    } else {
        EXIT_SUCCESS
    }
}

/// Write the bound tree to stdout and the graph to the configured path, as
/// the options request.
pub(crate) fn emit(compilation: &Compilation, options: &CompilerOptions) -> Result<(), String> {
    if options.show_tree {
        let mut stdout = io::stdout().lock();
        compilation
            .emit_tree(&mut stdout)
            .map_err(|e| format!("cannot print the bound tree: {}", e))?;
        stdout.flush().map_err(|e| e.to_string())?;
    }

    if options.show_cfg {
        let file = File::create(&options.cfg_path)
            .map_err(|e| format!("cannot create '{}': {}", options.cfg_path, e))?;
        let mut writer = BufWriter::new(file);
        compilation
            .emit_cfg(&mut writer)
            .map_err(|e| format!("cannot write '{}': {}", options.cfg_path, e))?;
        writer.flush().map_err(|e| e.to_string())?;
    }
    Ok(())
}
