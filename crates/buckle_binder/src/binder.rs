//! The binder implementation.
//!
//! Walks the syntax tree and produces the bound tree:
//! - Function and parameter declaration, overload registration
//! - Variable declaration with type inference for `auto`/`var`/`let`
//! - Name resolution through the scope chain
//! - Cast classification and insertion
//! - Operator and call resolution
//! - Loop labels for `break`/`continue`
//!
//! Recoverable problems are reported as diagnostics and binding continues
//! with an `Error` expression in place of the offending node.

use crate::conversion::Conversion;
use crate::program::BoundGlobalScope;
use crate::scope::BoundScope;
use buckle_ast::node::*;
use buckle_ast::SyntaxKind;
use buckle_bound::constant_folding::{fold_binary, fold_cast, fold_unary};
use buckle_bound::{
    builtins, BoundBinaryOperator, BoundBinaryOperatorKind, BoundBlockStatement, BoundConstant, BoundExpression,
    BoundLabel, BoundStatement, BoundUnaryOperator, FunctionSymbol, TypeClause, TypeFlags, TypeSymbol, Value,
    VariableKind, VariableSymbol,
};
use buckle_core::text::TextSpan;
use buckle_diagnostics::messages;
use buckle_diagnostics::{DiagnosticQueue, InternalError};
use buckle_flow::all_paths_return;
use buckle_parser::SyntaxTree;
use buckle_transformers::Lowerer;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// The attribute that makes a type clause non-nullable.
const NOT_NULL_ATTRIBUTE: &str = "NotNull";

/// Name of the synthesized entry point for non-script programs.
pub const MAIN_NAME: &str = "<Main>";
/// Name of the synthesized entry point for script submissions.
pub const EVAL_NAME: &str = "<Eval>";

pub struct Binder {
    /// The innermost scope. Parents are reached through `scope.parent`.
    scope: Box<BoundScope>,
    is_script: bool,
    /// The function whose body is being bound; `None` for global statements.
    function: Option<Arc<FunctionSymbol>>,
    /// `(break, continue)` labels of the enclosing loops.
    loop_stack: Vec<(BoundLabel, BoundLabel)>,
    label_count: usize,
    /// Inferred return type of each enclosing inline function.
    inline_returns: Vec<Option<TypeClause>>,
    diagnostics: DiagnosticQueue,
    /// The first contract violation hit while binding.
    internal_error: Option<InternalError>,
}

impl Binder {
    fn new(is_script: bool, parent: BoundScope) -> Self {
        Self {
            scope: Box::new(BoundScope::new(Some(Box::new(parent)))),
            is_script,
            function: None,
            loop_stack: Vec::new(),
            label_count: 0,
            inline_returns: Vec::new(),
            diagnostics: DiagnosticQueue::new(),
            internal_error: None,
        }
    }

    /// Bind one submission.
    ///
    /// Functions are declared first so that calls may precede declarations,
    /// then global statements are bound in order, then every function body.
    /// Declarations from `previous` submissions are visible but not rebound.
    pub fn bind_global_scope(
        is_script: bool,
        previous: Option<Arc<BoundGlobalScope>>,
        trees: &[SyntaxTree<'_>],
    ) -> Result<BoundGlobalScope, InternalError> {
        let parent = create_parent_scope(previous.as_ref());
        let mut binder = Binder::new(is_script, parent);

        for tree in trees {
            binder.diagnostics.extend(tree.diagnostics.iter().cloned());
        }

        let mut declarations = Vec::new();
        for tree in trees {
            for member in tree.root.members {
                if let Member::Function(declaration) = member {
                    if let Some(function) = binder.bind_function_declaration(declaration) {
                        declarations.push((function, *declaration));
                    }
                }
            }
        }

        let mut statements = Vec::new();
        let mut has_global_statements = false;
        for tree in trees {
            for member in tree.root.members {
                if let Member::GlobalStatement(statement) = member {
                    has_global_statements = true;
                    statements.push(binder.bind_statement(statement));
                }
            }
        }

        let functions = binder.scope.declared_functions();
        let variables = binder.scope.declared_variables();

        let mut main_function = None;
        let mut script_function = None;
        if is_script {
            script_function = Some(FunctionSymbol::new(EVAL_NAME, Vec::new(), TypeClause::ANY, None));
        } else if let Some(main) = functions.iter().find(|f| f.name() == "main") {
            let return_type = main.type_clause();
            let returns_int = return_type.base() == TypeSymbol::Int && return_type.dimensions() == 0;
            let span = main.declaration().unwrap_or_default();
            if !main.parameters().is_empty() || !(return_type.is_void() || returns_int) {
                binder.diagnostics.report(span, &messages::INVALID_MAIN, &[]);
            }
            if has_global_statements {
                binder.diagnostics.report(span, &messages::MAIN_AND_GLOBALS, &[]);
            }
            main_function = Some(main.clone());
        } else if has_global_statements {
            main_function = Some(FunctionSymbol::new(MAIN_NAME, Vec::new(), TypeClause::VOID, None));
        }

        let mut function_bodies = IndexMap::new();
        for (function, declaration) in declarations {
            let body = binder.bind_function_body(&function, declaration);
            function_bodies.insert(function, body);
        }

        if let Some(error) = binder.internal_error {
            return Err(error);
        }

        debug!(
            functions = functions.len(),
            variables = variables.len(),
            statements = statements.len(),
            diagnostics = binder.diagnostics.len(),
            "bound global scope"
        );

        Ok(BoundGlobalScope {
            previous,
            diagnostics: binder.diagnostics,
            main_function,
            script_function,
            functions,
            variables,
            statements,
            function_bodies,
        })
    }

    // ========================================================================
    // Scopes and labels
    // ========================================================================

    fn push_scope(&mut self) {
        let parent = std::mem::take(&mut self.scope);
        self.scope = Box::new(BoundScope::new(Some(parent)));
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scope.parent.take() {
            self.scope = parent;
        }
    }

    fn generate_loop_labels(&mut self) -> (BoundLabel, BoundLabel) {
        self.label_count += 1;
        (
            BoundLabel::new(format!("Break{}", self.label_count)),
            BoundLabel::new(format!("Continue{}", self.label_count)),
        )
    }

    fn record_internal_error(&mut self, error: InternalError) {
        if self.internal_error.is_none() {
            self.internal_error = Some(error);
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn bind_function_declaration(&mut self, declaration: &FunctionDeclaration<'_>) -> Option<Arc<FunctionSymbol>> {
        let return_type = self.bind_explicit_type_clause(declaration.return_type);

        let mut parameters: Vec<Arc<VariableSymbol>> = Vec::new();
        for parameter in declaration.parameters {
            let type_clause = self.bind_explicit_type_clause(parameter.type_clause);
            let name = parameter.identifier.text;
            if parameters.iter().any(|p| p.name() == name) {
                self.diagnostics.report(
                    parameter.identifier.span,
                    &messages::PARAMETER_ALREADY_DECLARED,
                    &[name],
                );
                continue;
            }
            parameters.push(VariableSymbol::parameter(name, type_clause));
        }

        if declaration.identifier.is_missing {
            return None;
        }

        let name = declaration.identifier.text;
        let function = FunctionSymbol::new(name, parameters, return_type, Some(declaration.identifier.span));
        if builtins::classify(&function).is_some() || !self.scope.try_declare_function(function.clone()) {
            self.diagnostics.report(
                declaration.identifier.span,
                &messages::FUNCTION_ALREADY_DECLARED,
                &[name],
            );
            return None;
        }
        Some(function)
    }

    fn bind_function_body(
        &mut self,
        function: &Arc<FunctionSymbol>,
        declaration: &FunctionDeclaration<'_>,
    ) -> Arc<BoundBlockStatement> {
        self.function = Some(function.clone());
        self.loop_stack.clear();
        self.push_scope();
        for parameter in function.parameters() {
            self.scope.try_declare_variable(parameter.clone());
        }
        let body = self.bind_block(declaration.body);
        self.pop_scope();
        self.function = None;
        body
    }

    /// Bind a type clause where `auto`, `var` and `let` are not allowed.
    fn bind_explicit_type_clause(&mut self, syntax: &TypeClauseSyntax<'_>) -> TypeClause {
        match self.bind_type_clause(syntax) {
            Some(type_clause) if type_clause.is_implicit() => {
                self.diagnostics.report(syntax.span(), &messages::CANNOT_USE_IMPLICIT, &[]);
                TypeClause::ERROR
            }
            Some(type_clause) => type_clause,
            None => TypeClause::ERROR,
        }
    }

    /// Resolve a written type. Implicit clauses come back with base `Any`
    /// and the `IMPLICIT` flag; the caller infers the real type.
    fn bind_type_clause(&mut self, syntax: &TypeClauseSyntax<'_>) -> Option<TypeClause> {
        let mut flags = TypeFlags::NULLABLE;
        for attribute in syntax.attributes {
            if attribute.text == NOT_NULL_ATTRIBUTE {
                flags.remove(TypeFlags::NULLABLE);
            } else if !attribute.is_missing {
                self.diagnostics
                    .report(attribute.span, &messages::UNKNOWN_ATTRIBUTE, &[attribute.text]);
            }
        }
        if syntax.const_ref_keyword.is_some() {
            flags |= TypeFlags::CONSTANT_REFERENCE;
        }
        if syntax.ref_keyword.is_some() {
            flags |= TypeFlags::REFERENCE;
        }
        if syntax.const_keyword.is_some() {
            flags |= TypeFlags::CONSTANT;
        }

        let type_name = &syntax.type_name;
        let base = match type_name.kind {
            SyntaxKind::AutoKeyword | SyntaxKind::VarKeyword => {
                flags |= TypeFlags::IMPLICIT;
                TypeSymbol::Any
            }
            SyntaxKind::LetKeyword => {
                flags |= TypeFlags::IMPLICIT | TypeFlags::CONSTANT;
                TypeSymbol::Any
            }
            _ if type_name.is_missing => return None,
            _ => match TypeSymbol::lookup(type_name.text) {
                Some(base) => base,
                None => {
                    self.diagnostics
                        .report(type_name.span, &messages::UNKNOWN_TYPE, &[type_name.text]);
                    return None;
                }
            },
        };
        if base == TypeSymbol::Void {
            flags.remove(TypeFlags::NULLABLE);
        }

        Some(TypeClause::new(base, flags, syntax.dimensions()))
    }

    fn declare_variable(
        &mut self,
        identifier: &Token<'_>,
        type_clause: TypeClause,
        constant: Option<BoundConstant>,
    ) -> Arc<VariableSymbol> {
        let kind = if self.function.is_none() {
            VariableKind::Global
        } else {
            VariableKind::Local
        };
        let variable = VariableSymbol::new(identifier.text, type_clause, kind, constant);
        if !identifier.is_missing && !self.scope.try_declare_variable(variable.clone()) {
            self.diagnostics
                .report(identifier.span, &messages::ALREADY_DECLARED, &[identifier.text]);
        }
        variable
    }

    fn bind_variable_declaration(&mut self, declaration: &VariableDeclarationStatement<'_>) -> Arc<BoundStatement> {
        let Some(declared) = self.bind_type_clause(declaration.type_clause) else {
            let initializer = declaration.initializer.map(|i| self.bind_expression(i));
            let variable = self.declare_variable(&declaration.identifier, TypeClause::ERROR, None);
            return Arc::new(BoundStatement::VariableDeclaration { variable, initializer });
        };

        let (type_clause, initializer) = if declared.is_implicit() {
            self.bind_implicit_initializer(declaration, declared)
        } else {
            self.bind_explicit_initializer(declaration, declared)
        };

        let constant = if type_clause.is_constant() {
            initializer.as_ref().and_then(|i| i.constant())
        } else {
            None
        };
        let variable = self.declare_variable(&declaration.identifier, type_clause, constant);
        Arc::new(BoundStatement::VariableDeclaration { variable, initializer })
    }

    fn bind_implicit_initializer(
        &mut self,
        declaration: &VariableDeclarationStatement<'_>,
        declared: TypeClause,
    ) -> (TypeClause, Option<Arc<BoundExpression>>) {
        if declaration.type_clause.dimensions() > 0 {
            self.diagnostics
                .report(declaration.type_clause.span(), &messages::IMPLIED_DIMENSIONS, &[]);
        }

        let Some(syntax) = declaration.initializer else {
            self.diagnostics
                .report(declaration.identifier.span, &messages::NO_INIT_ON_IMPLICIT, &[]);
            return (TypeClause::ERROR, None);
        };

        match syntax {
            Expression::Literal(literal) if literal.token.kind == SyntaxKind::NullKeyword => {
                self.diagnostics
                    .report(syntax.span(), &messages::NULL_ASSIGN_ON_IMPLICIT, &[]);
                return (TypeClause::ERROR, Some(self.bind_expression(syntax)));
            }
            Expression::InitializerList(list) if list.items.is_empty() => {
                self.diagnostics
                    .report(syntax.span(), &messages::EMPTY_INITIALIZER_LIST_ON_IMPLICIT, &[]);
                return (TypeClause::ERROR, Some(self.bind_expression(syntax)));
            }
            _ => {}
        }

        let initializer = self.bind_expression(syntax);
        let initializer_type = initializer.type_clause();
        if initializer_type.is_void() {
            self.diagnostics.report(syntax.span(), &messages::NO_VALUE, &[]);
            return (TypeClause::ERROR, Some(initializer));
        }
        if initializer_type.is_error() {
            return (TypeClause::ERROR, Some(initializer));
        }
        self.check_reference_initializer(declaration, declared);

        let type_clause = TypeClause::new(initializer_type.base(), declared.flags(), initializer_type.dimensions());
        (type_clause, Some(initializer))
    }

    fn bind_explicit_initializer(
        &mut self,
        declaration: &VariableDeclarationStatement<'_>,
        declared: TypeClause,
    ) -> (TypeClause, Option<Arc<BoundExpression>>) {
        if declared.is_void() {
            self.diagnostics
                .report(declaration.type_clause.span(), &messages::VOID_VARIABLE, &[]);
            let initializer = declaration.initializer.map(|i| self.bind_expression(i));
            return (TypeClause::ERROR, initializer);
        }
        self.check_reference_initializer(declaration, declared);

        let Some(syntax) = declaration.initializer else {
            return (declared, None);
        };
        let initializer = self.bind_expression_with_target(syntax, &declared);
        if initializer.type_clause().is_void() {
            self.diagnostics.report(syntax.span(), &messages::NO_VALUE, &[]);
            return (declared, Some(Arc::new(BoundExpression::Error)));
        }
        let initializer = self.bind_cast(initializer, &declared, false, syntax.span());
        (declared, Some(initializer))
    }

    fn check_reference_initializer(&mut self, declaration: &VariableDeclarationStatement<'_>, declared: TypeClause) {
        let is_reference_initializer = matches!(declaration.initializer, Some(Expression::Reference(_)));
        if declared.is_reference() {
            match declaration.initializer {
                None => self.diagnostics.report(
                    declaration.identifier.span,
                    &messages::REFERENCE_NO_INITIALIZATION,
                    &[],
                ),
                Some(initializer) if !is_reference_initializer => self.diagnostics.report(
                    initializer.span(),
                    &messages::REFERENCE_WRONG_INITIALIZATION,
                    &[],
                ),
                _ => {}
            }
        } else if let Some(initializer) = declaration.initializer.filter(|_| is_reference_initializer) {
            self.diagnostics.report(
                initializer.span(),
                &messages::WRONG_INITIALIZATION_REFERENCE,
                &[],
            );
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn bind_statement(&mut self, statement: &Statement<'_>) -> Arc<BoundStatement> {
        match statement {
            Statement::Block(block) => {
                let block = self.bind_block(block);
                Arc::new(BoundStatement::Block(block))
            }
            Statement::VariableDeclaration(declaration) => self.bind_variable_declaration(declaration),
            Statement::If(statement) => self.bind_if_statement(statement),
            Statement::While(statement) => self.bind_while_statement(statement),
            Statement::DoWhile(statement) => self.bind_do_while_statement(statement),
            Statement::For(statement) => self.bind_for_statement(statement),
            Statement::Break(statement) => self.bind_loop_jump(statement, true),
            Statement::Continue(statement) => self.bind_loop_jump(statement, false),
            Statement::Return(statement) => self.bind_return_statement(statement),
            Statement::Try(statement) => self.bind_try_statement(statement),
            Statement::Expression(statement) => self.bind_expression_statement(statement),
            Statement::Empty(_) => Arc::new(BoundStatement::Nop),
            Statement::LocalFunction(declaration) => {
                self.diagnostics
                    .report(declaration.identifier.span, &messages::LOCAL_FUNCTION, &[]);
                Arc::new(BoundStatement::Nop)
            }
        }
    }

    fn bind_block(&mut self, block: &BlockStatement<'_>) -> Arc<BoundBlockStatement> {
        self.push_scope();
        let statements = block.statements.iter().map(|s| self.bind_statement(s)).collect();
        self.pop_scope();
        Arc::new(BoundBlockStatement::new(statements))
    }

    fn bind_condition(&mut self, condition: &Expression<'_>) -> Arc<BoundExpression> {
        let bound = self.bind_expression(condition);
        self.bind_cast(bound, &TypeClause::BOOL, false, condition.span())
    }

    fn bind_if_statement(&mut self, statement: &IfStatement<'_>) -> Arc<BoundStatement> {
        let condition = self.bind_condition(statement.condition);
        let then = self.bind_statement(statement.then);
        let else_statement = statement
            .else_clause
            .as_ref()
            .map(|clause| self.bind_statement(clause.body));
        Arc::new(BoundStatement::If {
            condition,
            then,
            else_statement,
        })
    }

    fn bind_loop_body(&mut self, body: &Statement<'_>) -> (Arc<BoundStatement>, BoundLabel, BoundLabel) {
        let (break_label, continue_label) = self.generate_loop_labels();
        self.loop_stack.push((break_label.clone(), continue_label.clone()));
        let body = self.bind_statement(body);
        self.loop_stack.pop();
        (body, break_label, continue_label)
    }

    fn bind_while_statement(&mut self, statement: &WhileStatement<'_>) -> Arc<BoundStatement> {
        let condition = self.bind_condition(statement.condition);
        let (body, break_label, continue_label) = self.bind_loop_body(statement.body);
        Arc::new(BoundStatement::While {
            condition,
            body,
            break_label,
            continue_label,
        })
    }

    fn bind_do_while_statement(&mut self, statement: &DoWhileStatement<'_>) -> Arc<BoundStatement> {
        let (body, break_label, continue_label) = self.bind_loop_body(statement.body);
        let condition = self.bind_condition(statement.condition);
        Arc::new(BoundStatement::DoWhile {
            body,
            condition,
            break_label,
            continue_label,
        })
    }

    fn bind_for_statement(&mut self, statement: &ForStatement<'_>) -> Arc<BoundStatement> {
        self.push_scope();
        let initializer = self.bind_statement(statement.initializer);
        let condition = match statement.condition {
            Expression::Empty(_) => Arc::new(BoundExpression::literal(Value::Bool(true))),
            condition => self.bind_condition(condition),
        };
        let step = self.bind_expression(statement.step);
        let (body, break_label, continue_label) = self.bind_loop_body(statement.body);
        self.pop_scope();
        Arc::new(BoundStatement::For {
            initializer,
            condition,
            step,
            body,
            break_label,
            continue_label,
        })
    }

    fn bind_loop_jump(&mut self, statement: &KeywordStatement<'_>, is_break: bool) -> Arc<BoundStatement> {
        match self.loop_stack.last() {
            Some((break_label, continue_label)) => {
                let label = if is_break { break_label } else { continue_label };
                Arc::new(BoundStatement::Goto(label.clone()))
            }
            None => {
                let keyword = if is_break { "break" } else { "continue" };
                self.diagnostics.report(
                    statement.keyword.span,
                    &messages::INVALID_BREAK_OR_CONTINUE,
                    &[keyword],
                );
                Arc::new(BoundStatement::Expression {
                    expression: Arc::new(BoundExpression::Error),
                })
            }
        }
    }

    fn bind_return_statement(&mut self, statement: &ReturnStatement<'_>) -> Arc<BoundStatement> {
        let mut expression = statement.expression.map(|e| self.bind_expression(e));
        let span = statement
            .expression
            .map(|e| e.span())
            .unwrap_or(statement.keyword.span);

        if let Some(inferred) = self.inline_returns.last().copied() {
            match &expression {
                None => self
                    .diagnostics
                    .report(statement.keyword.span, &messages::MISSING_RETURN_VALUE, &[]),
                Some(value) => {
                    let value_type = value.type_clause();
                    match inferred {
                        None => {
                            if let Some(slot) = self.inline_returns.last_mut() {
                                *slot = Some(inferred_type(&value_type));
                            }
                        }
                        Some(inferred) => {
                            if !value_type.is_error() && !TypeClause::about_equal(&inferred, &value_type) {
                                self.diagnostics
                                    .report(span, &messages::INCONSISTENT_RETURN_TYPES, &[]);
                            }
                        }
                    }
                }
            }
            return Arc::new(BoundStatement::Return { expression });
        }

        match self.function.as_ref().map(|f| f.type_clause()) {
            Some(return_type) if return_type.is_void() => {
                if expression.is_some() {
                    self.diagnostics
                        .report(span, &messages::UNEXPECTED_RETURN_VALUE, &[]);
                }
            }
            Some(return_type) => match expression.take() {
                None => self
                    .diagnostics
                    .report(statement.keyword.span, &messages::MISSING_RETURN_VALUE, &[]),
                Some(value) => expression = Some(self.bind_cast(value, &return_type, false, span)),
            },
            None => {
                if expression.is_some() && !self.is_script {
                    self.diagnostics
                        .report(statement.keyword.span, &messages::GLOBAL_RETURN_VALUE, &[]);
                }
            }
        }
        Arc::new(BoundStatement::Return { expression })
    }

    fn bind_try_statement(&mut self, statement: &TryStatement<'_>) -> Arc<BoundStatement> {
        if statement.catch_clause.is_none() && statement.finally_clause.is_none() {
            self.diagnostics
                .report(statement.keyword.span, &messages::NO_CATCH_OR_FINALLY, &[]);
        }
        let body = self.bind_block(statement.body);
        let catch_body = statement.catch_clause.as_ref().map(|c| self.bind_block(c.body));
        let finally_body = statement.finally_clause.as_ref().map(|f| self.bind_block(f.body));
        Arc::new(BoundStatement::Try {
            body,
            catch_body,
            finally_body,
        })
    }

    fn bind_expression_statement(&mut self, statement: &ExpressionStatement<'_>) -> Arc<BoundStatement> {
        let expression = self.bind_expression(statement.expression);
        let at_script_top_level = self.is_script && self.function.is_none() && self.inline_returns.is_empty();
        let allowed = matches!(
            expression.as_ref(),
            BoundExpression::Assignment { .. }
                | BoundExpression::CompoundAssignment { .. }
                | BoundExpression::Call { .. }
                | BoundExpression::Error
                | BoundExpression::Empty
        );
        if !allowed && !at_script_top_level {
            self.diagnostics.report(
                statement.expression.span(),
                &messages::INVALID_EXPRESSION_STATEMENT,
                &[],
            );
        }
        Arc::new(BoundStatement::Expression { expression })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn bind_expression(&mut self, expression: &Expression<'_>) -> Arc<BoundExpression> {
        match expression {
            Expression::Literal(literal) => self.bind_literal_expression(literal),
            Expression::Name(name) => self.bind_name_expression(name),
            Expression::Assignment(assignment) => self.bind_assignment_expression(assignment),
            Expression::CompoundAssignment(assignment) => {
                let Some(operator_kind) = assignment.operator.kind.compound_operator() else {
                    return Arc::new(BoundExpression::Error);
                };
                let value = self.bind_expression(assignment.expression);
                self.bind_compound_assignment(&assignment.identifier, &assignment.operator, operator_kind, value)
            }
            Expression::Prefix(prefix) => {
                let operator_kind = match prefix.operator.kind {
                    SyntaxKind::PlusPlusToken => SyntaxKind::PlusToken,
                    _ => SyntaxKind::MinusToken,
                };
                let one = Arc::new(BoundExpression::literal(Value::Int(1)));
                self.bind_compound_assignment(&prefix.identifier, &prefix.operator, operator_kind, one)
            }
            Expression::Unary(unary) => self.bind_unary_expression(unary),
            Expression::Binary(binary) => self.bind_binary_expression(binary),
            Expression::Parenthesized(paren) => self.bind_expression(paren.expression),
            Expression::Call(call) => self.bind_call_expression(call),
            Expression::Index(index) => self.bind_index_expression(index),
            Expression::InitializerList(list) => self.bind_initializer_list(list, None),
            Expression::Reference(reference) => self.bind_reference_expression(reference),
            Expression::InlineFunction(inline) => self.bind_inline_function(inline),
            Expression::Empty(_) => Arc::new(BoundExpression::Empty),
        }
    }

    /// Bind an expression that flows into a slot of type `target`, so that
    /// initializer lists know their element type.
    fn bind_expression_with_target(&mut self, expression: &Expression<'_>, target: &TypeClause) -> Arc<BoundExpression> {
        match expression {
            Expression::InitializerList(list) => self.bind_initializer_list(list, Some(target)),
            _ => self.bind_expression(expression),
        }
    }

    /// Convert `expression` to `target`, inserting a cast node when needed.
    fn bind_cast(
        &mut self,
        expression: Arc<BoundExpression>,
        target: &TypeClause,
        is_explicit: bool,
        span: TextSpan,
    ) -> Arc<BoundExpression> {
        if expression.is_null_literal() {
            if !target.is_nullable() && !target.is_error() {
                self.diagnostics.report(span, &messages::NULL_ASSIGN_NOT_NULL, &[]);
            }
            return Arc::new(BoundExpression::Literal {
                type_clause: TypeClause::new(
                    target.base(),
                    TypeFlags::NULLABLE | TypeFlags::LITERAL,
                    target.dimensions(),
                ),
                value: Value::Null,
            });
        }

        let from = expression.type_clause();
        match Conversion::classify(&from, target) {
            Conversion::None => {
                if !from.is_error() && !target.is_error() {
                    let (from, to) = (from.to_string(), target.to_string());
                    self.diagnostics
                        .report(span, &messages::CANNOT_CONVERT, &[&from, &to]);
                }
                return Arc::new(BoundExpression::Error);
            }
            Conversion::Identity => return expression,
            Conversion::Explicit if !is_explicit => {
                let (from, to) = (from.to_string(), target.to_string());
                self.diagnostics
                    .report(span, &messages::CANNOT_CONVERT_IMPLICITLY, &[&from, &to]);
            }
            _ => {}
        }

        let constant = fold_cast(target, &expression);
        Arc::new(BoundExpression::Cast {
            type_clause: *target,
            expression,
            constant,
        })
    }

    fn bind_literal_expression(&mut self, literal: &LiteralExpression<'_>) -> Arc<BoundExpression> {
        let token = &literal.token;
        let value = match (token.kind, token.value) {
            (SyntaxKind::TrueKeyword, _) => Value::Bool(true),
            (SyntaxKind::FalseKeyword, _) => Value::Bool(false),
            (SyntaxKind::NullKeyword, _) => Value::Null,
            (_, TokenValue::Int(value)) => Value::Int(value),
            (_, TokenValue::Decimal(value)) => Value::Decimal(value),
            (_, TokenValue::String(value)) => Value::String(value.to_string()),
            (_, TokenValue::None) => return Arc::new(BoundExpression::Error),
        };
        Arc::new(BoundExpression::literal(value))
    }

    /// Resolve `identifier` to a variable, reporting when it names nothing
    /// or names a function.
    fn bind_variable_reference(&mut self, identifier: &Token<'_>) -> Option<Arc<VariableSymbol>> {
        if identifier.is_missing {
            return None;
        }
        let name = identifier.text;
        if let Some(variable) = self.scope.try_lookup_variable(name) {
            return Some(variable);
        }
        if self.scope.lookup_functions(name).is_empty() {
            self.diagnostics
                .report(identifier.span, &messages::UNDEFINED_NAME, &[name]);
        } else {
            self.diagnostics
                .report(identifier.span, &messages::NOT_A_VARIABLE, &[name]);
        }
        None
    }

    fn bind_name_expression(&mut self, name: &NameExpression<'_>) -> Arc<BoundExpression> {
        match self.bind_variable_reference(&name.identifier) {
            Some(variable) => Arc::new(BoundExpression::Variable { variable }),
            None => Arc::new(BoundExpression::Error),
        }
    }

    fn bind_assignment_expression(&mut self, assignment: &AssignmentExpression<'_>) -> Arc<BoundExpression> {
        let Some(variable) = self.bind_variable_reference(&assignment.identifier) else {
            return self.bind_expression(assignment.expression);
        };
        let target = variable.type_clause();
        let value = self.bind_expression_with_target(assignment.expression, &target);

        if variable.is_read_only() {
            self.diagnostics.report(
                assignment.equals.span,
                &messages::CONSTANT_ASSIGNMENT,
                &[variable.name()],
            );
        }

        let converted = self.bind_cast(value.clone(), &target, false, assignment.expression.span());
        if matches!(converted.as_ref(), BoundExpression::Error) {
            return value;
        }
        Arc::new(BoundExpression::Assignment {
            variable,
            expression: converted,
        })
    }

    fn bind_compound_assignment(
        &mut self,
        identifier: &Token<'_>,
        operator: &Token<'_>,
        operator_kind: SyntaxKind,
        value: Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let Some(variable) = self.bind_variable_reference(identifier) else {
            return value;
        };
        if variable.is_read_only() {
            self.diagnostics.report(
                operator.span,
                &messages::CONSTANT_ASSIGNMENT,
                &[variable.name()],
            );
        }

        let target = variable.type_clause();
        if target.is_error() || value.type_clause().is_error() {
            return Arc::new(BoundExpression::Error);
        }

        let value = if Conversion::classify(&value.type_clause(), &target) == Conversion::Implicit {
            self.bind_cast(value, &target, false, operator.span)
        } else {
            value
        };
        let value_type = value.type_clause();

        match BoundBinaryOperator::bind(operator_kind, &target, &value_type) {
            Some(bound_operator) => Arc::new(BoundExpression::CompoundAssignment {
                variable,
                operator: bound_operator,
                expression: value,
            }),
            None => {
                let (left, right) = (target.to_string(), value_type.to_string());
                self.diagnostics.report(
                    operator.span,
                    &messages::INVALID_BINARY_OPERATOR_USE,
                    &[operator.text, &left, &right],
                );
                Arc::new(BoundExpression::Error)
            }
        }
    }

    fn bind_unary_expression(&mut self, unary: &UnaryExpression<'_>) -> Arc<BoundExpression> {
        let operand = self.bind_expression(unary.operand);
        let operand_type = operand.type_clause();
        if operand_type.is_error() {
            return Arc::new(BoundExpression::Error);
        }

        match BoundUnaryOperator::bind(unary.operator.kind, &operand_type) {
            Some(operator) => {
                let constant = fold_unary(operator, &operand);
                Arc::new(BoundExpression::Unary {
                    operator,
                    operand,
                    constant,
                })
            }
            None => {
                let operand_type = operand_type.to_string();
                self.diagnostics.report(
                    unary.operator.span,
                    &messages::INVALID_UNARY_OPERATOR_USE,
                    &[unary.operator.text, &operand_type],
                );
                Arc::new(BoundExpression::Error)
            }
        }
    }

    fn bind_binary_expression(&mut self, binary: &BinaryExpression<'_>) -> Arc<BoundExpression> {
        let mut left = self.bind_expression(binary.left);
        let mut right = self.bind_expression(binary.right);
        if left.type_clause().is_error() || right.type_clause().is_error() {
            return Arc::new(BoundExpression::Error);
        }

        let kind = binary.operator.kind;
        if matches!(kind, SyntaxKind::IsKeyword | SyntaxKind::IsntKeyword) {
            return self.bind_null_test(binary, left, right);
        }

        if left.is_null_literal() && !right.is_null_literal() {
            left = retype_null(&right.type_clause());
        } else if right.is_null_literal() && !left.is_null_literal() {
            right = retype_null(&left.type_clause());
        }

        let (left_type, right_type) = (left.type_clause(), right.type_clause());
        if left_type.dimensions() == 0 && right_type.dimensions() == 0 {
            match (left_type.base(), right_type.base()) {
                (TypeSymbol::Int, TypeSymbol::Decimal) => {
                    left = self.bind_cast(left, &TypeClause::DECIMAL, false, binary.left.span());
                }
                (TypeSymbol::Decimal, TypeSymbol::Int) => {
                    right = self.bind_cast(right, &TypeClause::DECIMAL, false, binary.right.span());
                }
                _ => {}
            }
        }

        let (left_type, right_type) = (left.type_clause(), right.type_clause());
        match BoundBinaryOperator::bind(kind, &left_type, &right_type) {
            Some(operator) => {
                let constant = fold_binary(&left, operator, &right);
                Arc::new(BoundExpression::Binary {
                    left,
                    operator,
                    right,
                    constant,
                })
            }
            None => {
                let (left_type, right_type) = (left_type.to_string(), right_type.to_string());
                self.diagnostics.report(
                    binary.operator.span,
                    &messages::INVALID_BINARY_OPERATOR_USE,
                    &[binary.operator.text, &left_type, &right_type],
                );
                Arc::new(BoundExpression::Error)
            }
        }
    }

    /// `x is null` and `x isnt null`.
    fn bind_null_test(
        &mut self,
        binary: &BinaryExpression<'_>,
        left: Arc<BoundExpression>,
        right: Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        if !right.is_null_literal() {
            self.diagnostics
                .report(binary.right.span(), &messages::IS_WITHOUT_NULL, &[]);
            return Arc::new(BoundExpression::Error);
        }
        let Some(operator) = BoundBinaryOperator::bind_null_test(binary.operator.kind) else {
            return Arc::new(BoundExpression::Error);
        };

        let left_type = left.type_clause();
        if left_type.is_literal() && !left.is_null_literal() {
            let always = operator.kind == BoundBinaryOperatorKind::Isnt;
            self.diagnostics.report(
                binary.left.span().union(&binary.right.span()),
                &messages::ALWAYS_VALUE,
                &[if always { "true" } else { "false" }],
            );
        }

        let constant = fold_binary(&left, operator, &right);
        Arc::new(BoundExpression::Binary {
            left,
            operator,
            right,
            constant,
        })
    }

    fn bind_call_expression(&mut self, call: &CallExpression<'_>) -> Arc<BoundExpression> {
        if call.identifier.is_missing {
            return Arc::new(BoundExpression::Error);
        }
        let name = call.identifier.text;

        if call.arguments.len() == 1 {
            if let Some(base) = TypeSymbol::lookup(name).filter(|b| *b != TypeSymbol::Void) {
                let argument = call.arguments[0];
                let bound = self.bind_expression(argument);
                return self.bind_cast(bound, &TypeClause::nullable(base), true, argument.span());
            }
        }

        let candidates = self.scope.lookup_functions(name);
        if candidates.is_empty() {
            let message = if self.scope.try_lookup_variable(name).is_some() {
                &messages::CANNOT_CALL_NON_FUNCTION
            } else {
                &messages::UNDEFINED_FUNCTION
            };
            self.diagnostics.report(call.identifier.span, message, &[name]);
            return Arc::new(BoundExpression::Error);
        }

        let arguments: Vec<Arc<BoundExpression>> = call.arguments.iter().map(|a| self.bind_expression(a)).collect();

        let best = candidates
            .iter()
            .filter(|f| f.parameters().len() == arguments.len())
            .min_by_key(|f| overload_cost(f, &arguments));
        let Some(function) = best.cloned() else {
            let expected = candidates[0].parameters().len().to_string();
            let found = arguments.len().to_string();
            self.diagnostics.report(
                call.identifier.span.union(&call.close_paren.span),
                &messages::INCORRECT_ARGUMENT_COUNT,
                &[name, &expected, &found],
            );
            return Arc::new(BoundExpression::Error);
        };

        let mut converted = Vec::with_capacity(arguments.len());
        for (index, (argument, parameter)) in arguments.into_iter().zip(function.parameters()).enumerate() {
            let span = call.arguments[index].span();
            let target = parameter.type_clause();
            let from = argument.type_clause();
            let is_explicit = !argument.is_null_literal() && Conversion::classify(&from, &target).is_explicit();
            if is_explicit {
                let (position, from, to) = ((index + 1).to_string(), from.to_string(), target.to_string());
                self.diagnostics.report(
                    span,
                    &messages::INVALID_ARGUMENT_TYPE,
                    &[&position, &from, &to],
                );
            }
            converted.push(self.bind_cast(argument, &target, is_explicit, span));
        }

        Arc::new(BoundExpression::Call {
            function,
            arguments: converted,
        })
    }

    fn bind_index_expression(&mut self, index: &IndexExpression<'_>) -> Arc<BoundExpression> {
        let operand = self.bind_expression(index.operand);
        let bound_index = self.bind_expression(index.index);
        let bound_index = self.bind_cast(bound_index, &TypeClause::INT, false, index.index.span());

        let operand_type = operand.type_clause();
        if operand_type.is_error() {
            return Arc::new(BoundExpression::Error);
        }
        match operand_type.child_type() {
            Some(type_clause) => Arc::new(BoundExpression::Index {
                operand,
                index: bound_index,
                type_clause,
            }),
            None => {
                let operand_type = operand_type.to_string();
                self.diagnostics.report(
                    index.operand.span(),
                    &messages::CANNOT_APPLY_INDEXING,
                    &[&operand_type],
                );
                Arc::new(BoundExpression::Error)
            }
        }
    }

    fn bind_initializer_list(
        &mut self,
        list: &InitializerListExpression<'_>,
        target: Option<&TypeClause>,
    ) -> Arc<BoundExpression> {
        let items: Vec<(Arc<BoundExpression>, TextSpan)> = list
            .items
            .iter()
            .map(|item| {
                let bound = match target.and_then(TypeClause::child_type) {
                    Some(child) => self.bind_expression_with_target(item, &child),
                    None => self.bind_expression(item),
                };
                (bound, item.span())
            })
            .collect();

        let item_type = match target.and_then(TypeClause::child_type) {
            Some(child) => child,
            None => items
                .iter()
                .map(|(item, _)| item.type_clause())
                .find(|t| !(t.is_literal() && t.base() == TypeSymbol::Any))
                .map(|t| inferred_type(&t))
                .unwrap_or(TypeClause::ANY),
        };

        let items = items
            .into_iter()
            .map(|(item, span)| self.bind_cast(item, &item_type, false, span))
            .collect();
        let type_clause = TypeClause::new(
            item_type.base(),
            TypeFlags::NULLABLE,
            item_type.dimensions() + 1,
        );
        Arc::new(BoundExpression::InitializerList { items, type_clause })
    }

    fn bind_reference_expression(&mut self, reference: &ReferenceExpression<'_>) -> Arc<BoundExpression> {
        let Some(variable) = self.bind_variable_reference(&reference.identifier) else {
            return Arc::new(BoundExpression::Error);
        };
        let variable_type = variable.type_clause();
        let type_clause = variable_type.with_flags(variable_type.flags() | TypeFlags::REFERENCE);
        Arc::new(BoundExpression::Reference { variable, type_clause })
    }

    /// `{ statements; }` in expression position. The body must return a
    /// value on every path; the first `return` fixes the result type.
    fn bind_inline_function(&mut self, inline: &InlineFunctionExpression<'_>) -> Arc<BoundExpression> {
        let loop_stack = std::mem::take(&mut self.loop_stack);
        self.inline_returns.push(None);
        self.push_scope();
        let statements = inline.statements.iter().map(|s| self.bind_statement(s)).collect();
        self.pop_scope();
        let inferred = self.inline_returns.pop().flatten();
        self.loop_stack = loop_stack;

        let span = inline.open_brace.span.union(&inline.close_brace.span);
        let Some(return_type) = inferred else {
            self.diagnostics
                .report(span, &messages::MISSING_RETURN_STATEMENT, &[]);
            return Arc::new(BoundExpression::Error);
        };

        let body = Arc::new(BoundBlockStatement::new(statements));
        let lowered = Lowerer::new().lower(&Arc::new(BoundStatement::Block(body.clone())), &return_type);
        match all_paths_return(&lowered) {
            Ok(true) => {}
            Ok(false) => self
                .diagnostics
                .report(span, &messages::NOT_ALL_PATHS_RETURN, &[]),
            Err(error) => self.record_internal_error(error),
        }

        Arc::new(BoundExpression::InlineFunction { body, return_type })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Rebuild the scope chain of all previous submissions, oldest outermost.
fn create_parent_scope(previous: Option<&Arc<BoundGlobalScope>>) -> BoundScope {
    let mut history = Vec::new();
    let mut current = previous;
    while let Some(global_scope) = current {
        history.push(global_scope);
        current = global_scope.previous.as_ref();
    }

    history
        .into_iter()
        .rev()
        .fold(BoundScope::root(), |parent, global_scope| {
            let mut scope = BoundScope::new(Some(Box::new(parent)));
            for function in &global_scope.functions {
                scope.try_declare_function(function.clone());
            }
            for variable in &global_scope.variables {
                scope.try_declare_variable(variable.clone());
            }
            scope
        })
}

/// The type a variable or inline function takes from a value: nullable and
/// no longer a literal.
fn inferred_type(type_clause: &TypeClause) -> TypeClause {
    let flags = (type_clause.flags() - TypeFlags::LITERAL) | TypeFlags::NULLABLE;
    type_clause.with_flags(flags)
}

fn retype_null(type_clause: &TypeClause) -> Arc<BoundExpression> {
    Arc::new(BoundExpression::Literal {
        type_clause: TypeClause::new(
            type_clause.base(),
            TypeFlags::NULLABLE | TypeFlags::LITERAL,
            type_clause.dimensions(),
        ),
        value: Value::Null,
    })
}

/// `(conversion failures, non-identity conversions)` for passing
/// `arguments` to `function`. Lower is better.
fn overload_cost(function: &FunctionSymbol, arguments: &[Arc<BoundExpression>]) -> (usize, usize) {
    let mut failures = 0;
    let mut cost = 0;
    for (argument, parameter) in arguments.iter().zip(function.parameters()) {
        if argument.is_null_literal() {
            cost += 1;
            continue;
        }
        match Conversion::classify(&argument.type_clause(), &parameter.type_clause()) {
            Conversion::Identity => {}
            Conversion::Implicit => cost += 1,
            Conversion::Explicit | Conversion::None => failures += 1,
        }
    }
    (failures, cost)
}
