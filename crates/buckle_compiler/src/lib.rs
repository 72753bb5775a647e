//! buckle_compiler: Compiler orchestration.
//!
//! A `Compilation` owns the source texts of one submission, binds them once
//! on first use, and links to the previous submission so REPL sessions can
//! chain declarations and globals.

use buckle_binder::{bind_program, Binder, BoundGlobalScope, BoundProgram};
use buckle_bound::{builtins, BoundTreePrinter, FunctionSymbol, Symbol, Value};
use buckle_diagnostics::{messages, Diagnostic, DiagnosticQueue, InternalError};
use buckle_evaluator::{Console, EvaluationError, Evaluator, Globals, StdConsole};
use buckle_flow::ControlFlowGraph;
use buckle_options::CompilerOptions;
use buckle_parser::SyntaxTree;
use bumpalo::Bump;
use rustc_hash::FxHashSet;
use std::io;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of an evaluation request.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// The script value, if evaluation ran and produced one.
    pub value: Option<Value>,
    pub diagnostics: DiagnosticQueue,
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One submission: its source texts, options and the previous submission.
pub struct Compilation {
    is_script: bool,
    previous: Option<Arc<Compilation>>,
    texts: Vec<String>,
    options: CompilerOptions,
    global_scope: OnceLock<Result<Arc<BoundGlobalScope>, InternalError>>,
    program: OnceLock<Result<Arc<BoundProgram>, InternalError>>,
}

impl Compilation {
    /// A standalone program. Its entry point is `main` or the global
    /// statements.
    pub fn create(texts: Vec<String>) -> Self {
        Self::new(false, None, texts)
    }

    /// A script submission chained to `previous`. Its value is the last
    /// expression statement it executes.
    pub fn create_script(previous: Option<Arc<Compilation>>, texts: Vec<String>) -> Self {
        Self::new(true, previous, texts)
    }

    fn new(is_script: bool, previous: Option<Arc<Compilation>>, texts: Vec<String>) -> Self {
        let options = previous
            .as_ref()
            .map(|previous| previous.options.clone())
            .unwrap_or_default();
        Self {
            is_script,
            previous,
            texts,
            options,
            global_scope: OnceLock::new(),
            program: OnceLock::new(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn previous(&self) -> Option<&Arc<Compilation>> {
        self.previous.as_ref()
    }

    pub fn is_script(&self) -> bool {
        self.is_script
    }

    /// The bound global scope. Binding happens on the first call; later and
    /// concurrent callers share that result.
    pub fn global_scope(&self) -> Result<Arc<BoundGlobalScope>, InternalError> {
        self.global_scope.get_or_init(|| self.bind_global_scope()).clone()
    }

    fn bind_global_scope(&self) -> Result<Arc<BoundGlobalScope>, InternalError> {
        let previous = match &self.previous {
            Some(previous) => Some(previous.global_scope()?),
            None => None,
        };
        let arena = Bump::new();
        let trees: Vec<SyntaxTree<'_>> = self.texts.iter().map(|text| SyntaxTree::parse(&arena, text)).collect();
        debug!(trees = trees.len(), script = self.is_script, "binding submission");
        Binder::bind_global_scope(self.is_script, previous, &trees).map(Arc::new)
    }

    /// The lowered program, bound on the first call.
    pub fn program(&self) -> Result<Arc<BoundProgram>, InternalError> {
        self.program.get_or_init(|| self.bind_program()).clone()
    }

    fn bind_program(&self) -> Result<Arc<BoundProgram>, InternalError> {
        let previous = match &self.previous {
            Some(previous) => Some(previous.program()?),
            None => None,
        };
        bind_program(previous, &*self.global_scope()?).map(Arc::new)
    }

    /// Diagnostics of parsing, binding and lowering this submission.
    pub fn diagnostics(&self) -> Result<DiagnosticQueue, InternalError> {
        Ok(self.program()?.diagnostics.clone())
    }

    /// Evaluate against the process console.
    pub fn evaluate(&self, globals: &mut Globals) -> Result<EvaluationResult, InternalError> {
        self.evaluate_with(globals, &mut StdConsole)
    }

    /// Evaluate unless binding reported errors. A runtime fault ends
    /// evaluation with an `unhandled exception` diagnostic and no value.
    pub fn evaluate_with(
        &self,
        globals: &mut Globals,
        console: &mut dyn Console,
    ) -> Result<EvaluationResult, InternalError> {
        let global_scope = self.global_scope()?;
        if self.blocks_evaluation(&global_scope.diagnostics) {
            return Ok(EvaluationResult {
                value: None,
                diagnostics: global_scope.diagnostics.clone(),
            });
        }

        let program = self.program()?;
        let mut diagnostics = program.diagnostics.clone();
        if self.blocks_evaluation(&diagnostics) {
            return Ok(EvaluationResult { value: None, diagnostics });
        }

        let value = match Evaluator::new(&program, globals, console).evaluate() {
            Ok(value) => value,
            Err(EvaluationError::Fault(fault)) => {
                debug!(%fault, "unhandled runtime fault");
                diagnostics.push(Diagnostic::new(&messages::UNHANDLED_EXCEPTION, &[&fault.to_string()]));
                None
            }
            Err(EvaluationError::Internal(error)) => {
                warn!(%error, "evaluation aborted");
                return Err(error);
            }
        };
        Ok(EvaluationResult { value, diagnostics })
    }

    fn blocks_evaluation(&self, diagnostics: &DiagnosticQueue) -> bool {
        diagnostics.has_errors() || (self.options.warnings_as_errors && !diagnostics.is_empty())
    }

    /// Print the lowered functions of this submission.
    pub fn emit_tree<W: io::Write>(&self, writer: &mut W) -> Result<(), EmitError> {
        let program = self.program()?;
        let mut printer = BoundTreePrinter::new();
        for (function, body) in &program.functions {
            printer.print_function(function, body);
        }
        writer.write_all(printer.finish().as_bytes())?;
        Ok(())
    }

    /// Write the control flow graph of the entry point as Graphviz DOT.
    /// Nothing is written when the submission has no entry point.
    pub fn emit_cfg<W: io::Write>(&self, writer: &mut W) -> Result<(), EmitError> {
        let program = self.program()?;
        let Some(entry_point) = program.entry_point() else {
            return Ok(());
        };
        let body = program
            .function_body(entry_point)
            .ok_or_else(|| InternalError::MissingFunctionBody(entry_point.name().to_string()))?;
        let graph = ControlFlowGraph::create(body)?;
        graph.write_dot(writer)?;
        Ok(())
    }

    /// Symbols visible after this submission, newest first. A function is
    /// hidden by a newer one with the same signature and a variable by a
    /// newer one with the same name. Built-ins come last.
    pub fn symbols(&self) -> Result<Vec<Symbol>, InternalError> {
        let mut symbols = Vec::new();
        let mut variable_names = FxHashSet::default();
        let mut functions: Vec<Arc<FunctionSymbol>> = Vec::new();

        let mut scope = Some(self.global_scope()?);
        while let Some(current) = scope {
            for function in current.functions.iter().rev() {
                if !functions.iter().any(|seen| seen.signature_matches(function)) {
                    functions.push(function.clone());
                    symbols.push(Symbol::Function(function.clone()));
                }
            }
            for variable in current.variables.iter().rev() {
                if variable_names.insert(variable.name().to_string()) {
                    symbols.push(Symbol::Variable(variable.clone()));
                }
            }
            scope = current.previous.clone();
        }

        for builtin in builtins::all() {
            if !functions.iter().any(|seen| seen.signature_matches(builtin)) {
                symbols.push(Symbol::Function(builtin.clone()));
            }
        }
        Ok(symbols)
    }
}
