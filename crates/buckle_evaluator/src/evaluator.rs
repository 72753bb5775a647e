//! Tree-walking evaluation of lowered bound programs.
//!
//! Every function body is a flat statement list. Execution walks it by
//! index and jumps through a label map built once per body. Each call runs
//! its own statement loop, so `return` simply ends that loop. Calls nest on
//! the host stack, which grows on demand up to `MAX_CALL_DEPTH` calls.

use crate::console::Console;
use crate::fault::{EvaluationError, RuntimeFault};
use buckle_binder::BoundProgram;
use buckle_bound::builtins::{self, Builtin};
use buckle_bound::{
    BoundBlockStatement, BoundExpression, BoundLabel, BoundStatement, FunctionSymbol,
    SymbolId, Value, VariableKind, VariableSymbol,
};
use buckle_ast::SyntaxKind;
use buckle_diagnostics::InternalError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Shared storage for one variable. `ref` variables and parameters alias
/// the cell of the variable they refer to.
type Cell = Rc<RefCell<Value>>;

type Frame = FxHashMap<SymbolId, Cell>;

/// Label name to the index of the statement following it.
type LabelMap = FxHashMap<String, usize>;

const STAGE: &str = "evaluation";

/// Nested user calls allowed before a `StackOverflow` fault.
pub const MAX_CALL_DEPTH: usize = 10_000;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Global variable storage, owned by the caller and kept across
/// submissions.
#[derive(Debug, Default)]
pub struct Globals {
    cells: FxHashMap<SymbolId, Cell>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current value of `variable`, if it has been declared.
    pub fn get(&self, variable: &VariableSymbol) -> Option<Value> {
        self.cells.get(&variable.id()).map(|cell| cell.borrow().clone())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// How a statement list finished.
#[derive(Debug)]
enum Completion {
    Normal,
    Return(Option<Value>),
    /// A jump to a label outside the list that was executing.
    Goto(BoundLabel),
}

pub struct Evaluator<'a> {
    program: &'a BoundProgram,
    globals: &'a mut Globals,
    locals: Vec<Frame>,
    console: &'a mut dyn Console,
    random: Option<StdRng>,
    /// Value of the last expression statement, reported for scripts.
    last_value: Option<Value>,
    /// Keyed by block address. Every block belongs to `program`, which
    /// outlives the evaluator.
    labels: FxHashMap<*const BoundBlockStatement, Rc<LabelMap>>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(program: &'a BoundProgram, globals: &'a mut Globals, console: &'a mut dyn Console) -> Self {
        Self {
            program,
            globals,
            locals: Vec::new(),
            console,
            random: None,
            last_value: None,
            labels: FxHashMap::default(),
            depth: 0,
        }
    }

    /// Run the program's entry point. Yields the value of a script, or
    /// `None` when there is nothing to run or the result is null.
    pub fn evaluate(&mut self) -> Result<Option<Value>, EvaluationError> {
        let Some(function) = self.program.entry_point() else {
            return Ok(None);
        };
        let body = self
            .program
            .function_body(function)
            .ok_or_else(|| InternalError::MissingFunctionBody(function.name().to_string()))?
            .clone();

        debug!(entry_point = function.name(), "evaluating program");
        self.locals.push(Frame::default());
        let completion = self.execute_body(&body);
        self.locals.pop();

        let value = match completion? {
            Some(value) => Some(value),
            None => self.last_value.take(),
        };
        Ok(value.filter(|v| !v.is_null()))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Execute a function body. Every jump must resolve inside it.
    fn execute_body(&mut self, body: &BoundBlockStatement) -> Result<Option<Value>, EvaluationError> {
        match self.execute_block(body)? {
            Completion::Normal => Ok(None),
            Completion::Return(value) => Ok(value),
            Completion::Goto(label) => Err(InternalError::MissingLabel(label.name().to_string()).into()),
        }
    }

    fn execute_block(&mut self, block: &BoundBlockStatement) -> Result<Completion, EvaluationError> {
        let labels = self.labels_of(block);
        let statements = &block.statements;
        let mut index = 0;

        while index < statements.len() {
            let mut jump = None;
            match &*statements[index] {
                BoundStatement::Nop | BoundStatement::Label(_) => {}
                BoundStatement::VariableDeclaration { variable, initializer } => {
                    self.declare_variable(variable, initializer.as_deref())?;
                    self.last_value = None;
                }
                BoundStatement::Expression { expression } => {
                    self.last_value = Some(self.evaluate_expression(expression)?);
                }
                BoundStatement::Goto(label) => jump = Some(label),
                BoundStatement::ConditionalGoto {
                    label,
                    condition,
                    jump_if_true,
                } => {
                    let condition = self.evaluate_expression(condition)?;
                    if condition.as_bool().unwrap_or(false) == *jump_if_true {
                        jump = Some(label);
                    }
                }
                BoundStatement::Return { expression } => {
                    let value = match expression {
                        Some(expression) => Some(self.evaluate_expression(expression)?),
                        None => None,
                    };
                    return Ok(Completion::Return(value));
                }
                BoundStatement::Try {
                    body,
                    catch_body,
                    finally_body,
                } => match self.execute_try(body, catch_body.as_deref(), finally_body.as_deref())? {
                    Completion::Normal => {}
                    Completion::Goto(label) => match labels.get(label.name()) {
                        Some(target) => {
                            index = *target;
                            continue;
                        }
                        None => return Ok(Completion::Goto(label)),
                    },
                    completion @ Completion::Return(_) => return Ok(completion),
                },
                other => {
                    return Err(InternalError::UnexpectedStatement {
                        kind: other.kind().as_str(),
                        stage: STAGE,
                    }
                    .into())
                }
            }

            match jump {
                Some(label) => match labels.get(label.name()) {
                    Some(target) => index = *target,
                    None => return Ok(Completion::Goto(label.clone())),
                },
                None => index += 1,
            }
        }

        Ok(Completion::Normal)
    }

    fn labels_of(&mut self, block: &BoundBlockStatement) -> Rc<LabelMap> {
        self.labels
            .entry(block as *const BoundBlockStatement)
            .or_insert_with(|| Rc::new(label_indices(block)))
            .clone()
    }

    /// Faults raised in `body` run `catch_body`; `finally_body` always runs
    /// and its own return or jump wins.
    fn execute_try(
        &mut self,
        body: &BoundBlockStatement,
        catch_body: Option<&BoundBlockStatement>,
        finally_body: Option<&BoundBlockStatement>,
    ) -> Result<Completion, EvaluationError> {
        let mut result = self.execute_block(body);
        if let (Err(EvaluationError::Fault(fault)), Some(catch_body)) = (&result, catch_body) {
            debug!(%fault, "caught runtime fault");
            result = self.execute_block(catch_body);
        }

        if let Some(finally_body) = finally_body {
            match self.execute_block(finally_body)? {
                Completion::Normal => {}
                completion => return Ok(completion),
            }
        }
        result
    }

    // ========================================================================
    // Variables
    // ========================================================================

    fn frame(&mut self) -> Result<&mut Frame, InternalError> {
        self.locals.last_mut().ok_or(InternalError::EmptyCallStack)
    }

    fn cell(&mut self, variable: &VariableSymbol) -> Result<Cell, InternalError> {
        let cell = match variable.kind() {
            VariableKind::Global => self.globals.cells.get(&variable.id()).cloned(),
            VariableKind::Local | VariableKind::Parameter => self.frame()?.get(&variable.id()).cloned(),
        };
        cell.ok_or_else(|| InternalError::UnboundVariable(variable.name().to_string()))
    }

    fn bind_cell(&mut self, variable: &VariableSymbol, cell: Cell) -> Result<(), InternalError> {
        match variable.kind() {
            VariableKind::Global => {
                self.globals.cells.insert(variable.id(), cell);
            }
            VariableKind::Local | VariableKind::Parameter => {
                self.frame()?.insert(variable.id(), cell);
            }
        }
        Ok(())
    }

    /// Create storage for `variable`. A `ref` variable initialized with a
    /// reference shares the referenced variable's storage.
    fn declare_variable(
        &mut self,
        variable: &VariableSymbol,
        initializer: Option<&BoundExpression>,
    ) -> Result<(), EvaluationError> {
        let cell = match initializer {
            Some(BoundExpression::Reference { variable: target, .. }) if variable.type_clause().is_reference() => {
                self.cell(target)?
            }
            Some(initializer) => Rc::new(RefCell::new(self.evaluate_expression(initializer)?)),
            None => Rc::new(RefCell::new(Value::Null)),
        };
        self.bind_cell(variable, cell)?;
        Ok(())
    }

    fn read_variable(&mut self, variable: &VariableSymbol) -> Result<Value, InternalError> {
        Ok(self.cell(variable)?.borrow().clone())
    }

    fn assign_variable(&mut self, variable: &VariableSymbol, value: Value) -> Result<(), InternalError> {
        *self.cell(variable)?.borrow_mut() = value;
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn evaluate_expression(&mut self, expression: &BoundExpression) -> Result<Value, EvaluationError> {
        if let Some(constant) = expression.constant() {
            return Ok(constant.value);
        }

        match expression {
            BoundExpression::Literal { value, .. } => Ok(value.clone()),
            BoundExpression::Variable { variable } | BoundExpression::Reference { variable, .. } => {
                Ok(self.read_variable(variable)?)
            }
            BoundExpression::Assignment { variable, expression } => {
                let value = self.evaluate_expression(expression)?;
                self.assign_variable(variable, value.clone())?;
                Ok(value)
            }
            BoundExpression::CompoundAssignment {
                variable,
                operator,
                expression,
            } => {
                let current = self.read_variable(variable)?;
                let operand = self.evaluate_expression(expression)?;
                let value = operator
                    .evaluate(&current, &operand)
                    .map_err(|fault| EvaluationError::from_operator(fault, current.kind_name()))?;
                self.assign_variable(variable, value.clone())?;
                Ok(value)
            }
            BoundExpression::Unary { operator, operand, .. } => {
                let operand = self.evaluate_expression(operand)?;
                operator
                    .evaluate(&operand)
                    .map_err(|fault| EvaluationError::from_operator(fault, operand.kind_name()))
            }
            BoundExpression::Binary {
                left, operator, right, ..
            } => {
                let left = self.evaluate_expression(left)?;
                match (operator.syntax_kind, &left) {
                    (SyntaxKind::AmpersandAmpersandToken, Value::Bool(false)) => return Ok(Value::Bool(false)),
                    (SyntaxKind::PipePipeToken, Value::Bool(true)) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right = self.evaluate_expression(right)?;
                operator
                    .evaluate(&left, &right)
                    .map_err(|fault| EvaluationError::from_operator(fault, left.kind_name()))
            }
            BoundExpression::Call { function, arguments } => self.evaluate_call(function, arguments),
            BoundExpression::Cast {
                type_clause, expression, ..
            } => {
                let value = self.evaluate_expression(expression)?;
                if type_clause.dimensions() > 0 {
                    return Ok(value);
                }
                value
                    .convert(type_clause.base())
                    .map_err(|fault| RuntimeFault::from(fault).into())
            }
            BoundExpression::Index { operand, index, .. } => {
                let operand = self.evaluate_expression(operand)?;
                let index = self.evaluate_expression(index)?;
                evaluate_index(operand, index)
            }
            BoundExpression::InitializerList { items, .. } => {
                let items = items
                    .iter()
                    .map(|item| self.evaluate_expression(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(items))
            }
            BoundExpression::InlineFunction { body, .. } => match self.execute_block(body)? {
                Completion::Return(value) => Ok(value.unwrap_or(Value::Null)),
                Completion::Normal => Ok(Value::Null),
                Completion::Goto(label) => Err(InternalError::MissingLabel(label.name().to_string()).into()),
            },
            BoundExpression::Empty => Ok(Value::Null),
            BoundExpression::Error => Err(InternalError::UnexpectedExpression {
                kind: expression.kind().as_str(),
                stage: STAGE,
            }
            .into()),
        }
    }

    fn evaluate_call(
        &mut self,
        function: &Arc<FunctionSymbol>,
        arguments: &[Arc<BoundExpression>],
    ) -> Result<Value, EvaluationError> {
        if let Some(builtin) = builtins::classify(function) {
            return self.evaluate_builtin(builtin, arguments);
        }
        let Some((declared, body)) = self.program.lookup_function(function) else {
            return Err(InternalError::MissingFunctionBody(function.name().to_string()).into());
        };
        let (declared, body) = (declared.clone(), body.clone());

        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeFault::StackOverflow(MAX_CALL_DEPTH).into());
        }

        let mut frame = Frame::default();
        for (argument, parameter) in arguments.iter().zip(declared.parameters()) {
            let cell = match &**argument {
                BoundExpression::Reference { variable, .. } if parameter.type_clause().is_reference() => {
                    self.cell(variable)?
                }
                argument => Rc::new(RefCell::new(self.evaluate_expression(argument)?)),
            };
            frame.insert(parameter.id(), cell);
        }

        debug!(function = declared.name(), depth = self.depth, "call");
        self.depth += 1;
        self.locals.push(frame);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.execute_body(&body));
        self.locals.pop();
        self.depth -= 1;
        Ok(result?.unwrap_or(Value::Null))
    }

    fn evaluate_builtin(&mut self, builtin: Builtin, arguments: &[Arc<BoundExpression>]) -> Result<Value, EvaluationError> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate_expression(argument)?);
        }
        let first = values.into_iter().next().unwrap_or(Value::Null);

        let io = |error: std::io::Error| EvaluationError::from(RuntimeFault::Io(error.to_string()));
        match builtin {
            Builtin::Print => {
                if !first.is_null() {
                    self.console.write(&first.to_string()).map_err(io)?;
                }
                Ok(Value::Null)
            }
            Builtin::PrintLine => {
                let text = if first.is_null() { String::new() } else { first.to_string() };
                self.console.write_line(&text).map_err(io)?;
                Ok(Value::Null)
            }
            Builtin::Input => {
                let line = self.console.read_line().map_err(io)?;
                Ok(Value::String(line.unwrap_or_default()))
            }
            Builtin::RandInt => {
                let max = first.as_int().ok_or(RuntimeFault::NullValue)?;
                if max <= 0 {
                    return Ok(Value::Int(0));
                }
                let random = self.random.get_or_insert_with(StdRng::from_entropy);
                Ok(Value::Int(random.gen_range(0..max)))
            }
            Builtin::Value => {
                if first.is_null() {
                    return Err(RuntimeFault::NullValue.into());
                }
                Ok(first)
            }
            Builtin::HasValue => Ok(Value::Bool(!first.is_null())),
        }
    }
}

fn label_indices(block: &BoundBlockStatement) -> LabelMap {
    block
        .statements
        .iter()
        .enumerate()
        .filter_map(|(index, statement)| match &**statement {
            BoundStatement::Label(label) => Some((label.name().to_string(), index + 1)),
            _ => None,
        })
        .collect()
}

fn evaluate_index(operand: Value, index: Value) -> Result<Value, EvaluationError> {
    let items = match operand {
        Value::Array(items) => items,
        Value::Null => return Err(RuntimeFault::NullArray.into()),
        other => {
            return Err(InternalError::UnexpectedValue {
                expected: "array",
                found: other.kind_name().to_string(),
            }
            .into())
        }
    };
    let index = index.as_int().ok_or(RuntimeFault::NullValue)?;
    let length = items.len();
    usize::try_from(index)
        .ok()
        .and_then(|i| items.into_iter().nth(i))
        .ok_or_else(|| RuntimeFault::IndexOutOfRange { index, length }.into())
}
