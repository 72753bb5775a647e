//! Bound global scopes and programs.
//!
//! A `BoundGlobalScope` is the unlowered result of binding one submission.
//! `bind_program` lowers it into a `BoundProgram`. Both link to the previous
//! submission so earlier declarations stay visible and callable.

use buckle_bound::{BoundBlockStatement, BoundStatement, FunctionSymbol, TypeClause, VariableSymbol};
use buckle_diagnostics::{messages, DiagnosticQueue, InternalError};
use buckle_flow::all_paths_return;
use buckle_transformers::Lowerer;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct BoundGlobalScope {
    pub previous: Option<Arc<BoundGlobalScope>>,
    /// Syntax and binding diagnostics of this submission.
    pub diagnostics: DiagnosticQueue,
    pub main_function: Option<Arc<FunctionSymbol>>,
    pub script_function: Option<Arc<FunctionSymbol>>,
    /// Functions declared by this submission.
    pub functions: Vec<Arc<FunctionSymbol>>,
    /// Global variables declared at the top level of this submission.
    pub variables: Vec<Arc<VariableSymbol>>,
    pub statements: Vec<Arc<BoundStatement>>,
    /// Unlowered bodies of `functions`.
    pub function_bodies: IndexMap<Arc<FunctionSymbol>, Arc<BoundBlockStatement>>,
}

#[derive(Debug)]
pub struct BoundProgram {
    pub previous: Option<Arc<BoundProgram>>,
    pub diagnostics: DiagnosticQueue,
    pub main_function: Option<Arc<FunctionSymbol>>,
    pub script_function: Option<Arc<FunctionSymbol>>,
    /// Lowered bodies, including the synthesized entry point.
    pub functions: IndexMap<Arc<FunctionSymbol>, Arc<BoundBlockStatement>>,
}

impl BoundProgram {
    /// The function evaluation starts in.
    pub fn entry_point(&self) -> Option<&Arc<FunctionSymbol>> {
        self.main_function.as_ref().or(self.script_function.as_ref())
    }

    /// The declaring symbol and lowered body of the newest function whose
    /// signature matches `function`.
    pub fn lookup_function(
        &self,
        function: &FunctionSymbol,
    ) -> Option<(&Arc<FunctionSymbol>, &Arc<BoundBlockStatement>)> {
        let mut program = Some(self);
        while let Some(current) = program {
            if let Some(entry) = current.functions.get_key_value(function) {
                return Some(entry);
            }
            program = current.previous.as_deref();
        }
        None
    }

    pub fn function_body(&self, function: &FunctionSymbol) -> Option<&Arc<BoundBlockStatement>> {
        self.lookup_function(function).map(|(_, body)| body)
    }
}

/// Lower every function body of `global_scope` and check that non-void
/// functions return on all paths. Global statements become the body of the
/// script or synthesized main function.
pub fn bind_program(
    previous: Option<Arc<BoundProgram>>,
    global_scope: &BoundGlobalScope,
) -> Result<BoundProgram, InternalError> {
    let mut diagnostics = global_scope.diagnostics.clone();
    let mut lowerer = Lowerer::new();
    let mut functions = IndexMap::new();

    for (function, body) in &global_scope.function_bodies {
        let return_type = function.type_clause();
        let lowered = lower(&mut lowerer, body.clone(), &return_type)?;
        if !return_type.is_void() && !return_type.is_error() && !all_paths_return(&lowered)? {
            if let Some(span) = function.declaration() {
                diagnostics.report(span, &messages::NOT_ALL_PATHS_RETURN, &[]);
            }
        }
        functions.insert(function.clone(), lowered);
    }

    let entry_point = global_scope
        .main_function
        .iter()
        .chain(global_scope.script_function.iter())
        .find(|f| !functions.contains_key::<FunctionSymbol>(f));
    if let Some(entry_point) = entry_point {
        let body = Arc::new(BoundBlockStatement::new(global_scope.statements.clone()));
        let lowered = lower(&mut lowerer, body, &entry_point.type_clause())?;
        functions.insert(entry_point.clone(), lowered);
    }

    debug!(functions = functions.len(), diagnostics = diagnostics.len(), "bound program");

    Ok(BoundProgram {
        previous,
        diagnostics,
        main_function: global_scope.main_function.clone(),
        script_function: global_scope.script_function.clone(),
        functions,
    })
}

fn lower(
    lowerer: &mut Lowerer,
    body: Arc<BoundBlockStatement>,
    return_type: &TypeClause,
) -> Result<Arc<BoundBlockStatement>, InternalError> {
    let lowered = lowerer.lower(&Arc::new(BoundStatement::Block(body)), return_type);
    Lowerer::verify(&lowered)?;
    Ok(lowered)
}
