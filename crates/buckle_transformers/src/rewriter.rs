//! The bound tree rewriter.
//!
//! Every statement and expression variant has its own method. The default
//! implementation rewrites the children and rebuilds the node only when a
//! child came back as a different `Arc`; otherwise the original node is
//! returned, so callers can detect "no change" with `Arc::ptr_eq`.

use buckle_bound::constant_folding::{fold_binary, fold_cast, fold_unary};
use buckle_bound::{
    BoundBinaryOperator, BoundBlockStatement, BoundConstant, BoundExpression, BoundLabel,
    BoundStatement, BoundUnaryOperator, FunctionSymbol, TypeClause, VariableSymbol,
};
use std::sync::Arc;

fn same<T>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b)
}

fn same_option<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

pub trait BoundTreeRewriter {
    // ========================================================================
    // Statements
    // ========================================================================

    fn rewrite_statement(&mut self, node: &Arc<BoundStatement>) -> Arc<BoundStatement> {
        match &**node {
            BoundStatement::Block(block) => self.rewrite_block_statement(node, block),
            BoundStatement::VariableDeclaration { variable, initializer } => {
                self.rewrite_variable_declaration(node, variable, initializer.as_ref())
            }
            BoundStatement::If { condition, then, else_statement } => {
                self.rewrite_if_statement(node, condition, then, else_statement.as_ref())
            }
            BoundStatement::While { condition, body, break_label, continue_label } => {
                self.rewrite_while_statement(node, condition, body, break_label, continue_label)
            }
            BoundStatement::DoWhile { body, condition, break_label, continue_label } => {
                self.rewrite_do_while_statement(node, body, condition, break_label, continue_label)
            }
            BoundStatement::For { initializer, condition, step, body, break_label, continue_label } => self
                .rewrite_for_statement(node, initializer, condition, step, body, break_label, continue_label),
            BoundStatement::Expression { expression } => self.rewrite_expression_statement(node, expression),
            BoundStatement::Label(_) | BoundStatement::Goto(_) | BoundStatement::Nop => node.clone(),
            BoundStatement::ConditionalGoto { label, condition, jump_if_true } => {
                self.rewrite_conditional_goto_statement(node, label, condition, *jump_if_true)
            }
            BoundStatement::Return { expression } => self.rewrite_return_statement(node, expression.as_ref()),
            BoundStatement::Try { body, catch_body, finally_body } => {
                self.rewrite_try_statement(node, body, catch_body.as_ref(), finally_body.as_ref())
            }
        }
    }

    /// Rewrite every statement of a block, returning the same block when
    /// none of them changed.
    fn rewrite_block(&mut self, block: &Arc<BoundBlockStatement>) -> Arc<BoundBlockStatement> {
        let mut rewritten: Option<Vec<Arc<BoundStatement>>> = None;
        for (i, statement) in block.statements.iter().enumerate() {
            let new_statement = self.rewrite_statement(statement);
            if rewritten.is_none() && !same(&new_statement, statement) {
                rewritten = Some(block.statements[..i].to_vec());
            }
            if let Some(statements) = rewritten.as_mut() {
                statements.push(new_statement);
            }
        }
        match rewritten {
            Some(statements) => Arc::new(BoundBlockStatement::new(statements)),
            None => block.clone(),
        }
    }

    fn rewrite_block_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        block: &Arc<BoundBlockStatement>,
    ) -> Arc<BoundStatement> {
        let new_block = self.rewrite_block(block);
        if same(&new_block, block) {
            return node.clone();
        }
        Arc::new(BoundStatement::Block(new_block))
    }

    fn rewrite_variable_declaration(
        &mut self,
        node: &Arc<BoundStatement>,
        variable: &Arc<VariableSymbol>,
        initializer: Option<&Arc<BoundExpression>>,
    ) -> Arc<BoundStatement> {
        let Some(initializer) = initializer else {
            return node.clone();
        };
        let new_initializer = self.rewrite_expression(initializer);
        if same(&new_initializer, initializer) {
            return node.clone();
        }
        Arc::new(BoundStatement::VariableDeclaration {
            variable: variable.clone(),
            initializer: Some(new_initializer),
        })
    }

    fn rewrite_if_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        then: &Arc<BoundStatement>,
        else_statement: Option<&Arc<BoundStatement>>,
    ) -> Arc<BoundStatement> {
        let new_condition = self.rewrite_expression(condition);
        let new_then = self.rewrite_statement(then);
        let new_else = else_statement.map(|statement| self.rewrite_statement(statement));
        if same(&new_condition, condition) && same(&new_then, then) && same_option(&new_else, &else_statement.cloned())
        {
            return node.clone();
        }
        Arc::new(BoundStatement::If {
            condition: new_condition,
            then: new_then,
            else_statement: new_else,
        })
    }

    fn rewrite_while_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        body: &Arc<BoundStatement>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let new_condition = self.rewrite_expression(condition);
        let new_body = self.rewrite_statement(body);
        if same(&new_condition, condition) && same(&new_body, body) {
            return node.clone();
        }
        Arc::new(BoundStatement::While {
            condition: new_condition,
            body: new_body,
            break_label: break_label.clone(),
            continue_label: continue_label.clone(),
        })
    }

    fn rewrite_do_while_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        body: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let new_body = self.rewrite_statement(body);
        let new_condition = self.rewrite_expression(condition);
        if same(&new_condition, condition) && same(&new_body, body) {
            return node.clone();
        }
        Arc::new(BoundStatement::DoWhile {
            body: new_body,
            condition: new_condition,
            break_label: break_label.clone(),
            continue_label: continue_label.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn rewrite_for_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        initializer: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        step: &Arc<BoundExpression>,
        body: &Arc<BoundStatement>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let new_initializer = self.rewrite_statement(initializer);
        let new_condition = self.rewrite_expression(condition);
        let new_step = self.rewrite_expression(step);
        let new_body = self.rewrite_statement(body);
        if same(&new_initializer, initializer)
            && same(&new_condition, condition)
            && same(&new_step, step)
            && same(&new_body, body)
        {
            return node.clone();
        }
        Arc::new(BoundStatement::For {
            initializer: new_initializer,
            condition: new_condition,
            step: new_step,
            body: new_body,
            break_label: break_label.clone(),
            continue_label: continue_label.clone(),
        })
    }

    fn rewrite_expression_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        expression: &Arc<BoundExpression>,
    ) -> Arc<BoundStatement> {
        let new_expression = self.rewrite_expression(expression);
        if same(&new_expression, expression) {
            return node.clone();
        }
        Arc::new(BoundStatement::Expression { expression: new_expression })
    }

    fn rewrite_conditional_goto_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        label: &BoundLabel,
        condition: &Arc<BoundExpression>,
        jump_if_true: bool,
    ) -> Arc<BoundStatement> {
        let new_condition = self.rewrite_expression(condition);
        if same(&new_condition, condition) {
            return node.clone();
        }
        Arc::new(BoundStatement::ConditionalGoto {
            label: label.clone(),
            condition: new_condition,
            jump_if_true,
        })
    }

    fn rewrite_return_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        expression: Option<&Arc<BoundExpression>>,
    ) -> Arc<BoundStatement> {
        let Some(expression) = expression else {
            return node.clone();
        };
        let new_expression = self.rewrite_expression(expression);
        if same(&new_expression, expression) {
            return node.clone();
        }
        Arc::new(BoundStatement::Return { expression: Some(new_expression) })
    }

    fn rewrite_try_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        body: &Arc<BoundBlockStatement>,
        catch_body: Option<&Arc<BoundBlockStatement>>,
        finally_body: Option<&Arc<BoundBlockStatement>>,
    ) -> Arc<BoundStatement> {
        let new_body = self.rewrite_block(body);
        let new_catch = catch_body.map(|block| self.rewrite_block(block));
        let new_finally = finally_body.map(|block| self.rewrite_block(block));
        if same(&new_body, body)
            && same_option(&new_catch, &catch_body.cloned())
            && same_option(&new_finally, &finally_body.cloned())
        {
            return node.clone();
        }
        Arc::new(BoundStatement::Try {
            body: new_body,
            catch_body: new_catch,
            finally_body: new_finally,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn rewrite_expression(&mut self, node: &Arc<BoundExpression>) -> Arc<BoundExpression> {
        match &**node {
            BoundExpression::Literal { .. }
            | BoundExpression::Variable { .. }
            | BoundExpression::Reference { .. }
            | BoundExpression::Empty
            | BoundExpression::Error => node.clone(),
            BoundExpression::Assignment { variable, expression } => {
                self.rewrite_assignment_expression(node, variable, expression)
            }
            BoundExpression::CompoundAssignment { variable, operator, expression } => {
                self.rewrite_compound_assignment_expression(node, variable, *operator, expression)
            }
            BoundExpression::Unary { operator, operand, .. } => self.rewrite_unary_expression(node, *operator, operand),
            BoundExpression::Binary { left, operator, right, .. } => {
                self.rewrite_binary_expression(node, left, *operator, right)
            }
            BoundExpression::Call { function, arguments } => self.rewrite_call_expression(node, function, arguments),
            BoundExpression::Cast { type_clause, expression, .. } => {
                self.rewrite_cast_expression(node, type_clause, expression)
            }
            BoundExpression::Index { operand, index, type_clause } => {
                self.rewrite_index_expression(node, operand, index, type_clause)
            }
            BoundExpression::InitializerList { items, type_clause } => {
                self.rewrite_initializer_list_expression(node, items, type_clause)
            }
            BoundExpression::InlineFunction { body, return_type } => {
                self.rewrite_inline_function_expression(node, body, return_type)
            }
        }
    }

    /// Rewrite a list of expressions. `None` when nothing changed.
    fn rewrite_expressions(&mut self, items: &[Arc<BoundExpression>]) -> Option<Vec<Arc<BoundExpression>>> {
        let mut rewritten: Option<Vec<Arc<BoundExpression>>> = None;
        for (i, item) in items.iter().enumerate() {
            let new_item = self.rewrite_expression(item);
            if rewritten.is_none() && !same(&new_item, item) {
                rewritten = Some(items[..i].to_vec());
            }
            if let Some(new_items) = rewritten.as_mut() {
                new_items.push(new_item);
            }
        }
        rewritten
    }

    fn rewrite_assignment_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        variable: &Arc<VariableSymbol>,
        expression: &Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let new_expression = self.rewrite_expression(expression);
        if same(&new_expression, expression) {
            return node.clone();
        }
        Arc::new(BoundExpression::Assignment {
            variable: variable.clone(),
            expression: new_expression,
        })
    }

    /// `x op= e` becomes `x = x op e`, which is then rewritten as an
    /// ordinary assignment.
    fn rewrite_compound_assignment_expression(
        &mut self,
        _node: &Arc<BoundExpression>,
        variable: &Arc<VariableSymbol>,
        operator: &'static BoundBinaryOperator,
        expression: &Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let binary = Arc::new(BoundExpression::Binary {
            left: Arc::new(BoundExpression::Variable { variable: variable.clone() }),
            operator,
            right: expression.clone(),
            constant: None,
        });
        let assignment = Arc::new(BoundExpression::Assignment {
            variable: variable.clone(),
            expression: binary,
        });
        self.rewrite_expression(&assignment)
    }

    fn rewrite_unary_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        operator: &'static BoundUnaryOperator,
        operand: &Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let new_operand = self.rewrite_expression(operand);
        if same(&new_operand, operand) {
            return node.clone();
        }
        let constant = fold_unary(operator, &new_operand);
        Arc::new(BoundExpression::Unary {
            operator,
            operand: new_operand,
            constant,
        })
    }

    fn rewrite_binary_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        left: &Arc<BoundExpression>,
        operator: &'static BoundBinaryOperator,
        right: &Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let new_left = self.rewrite_expression(left);
        let new_right = self.rewrite_expression(right);
        if same(&new_left, left) && same(&new_right, right) {
            return node.clone();
        }
        let constant = fold_binary(&new_left, operator, &new_right);
        Arc::new(BoundExpression::Binary {
            left: new_left,
            operator,
            right: new_right,
            constant,
        })
    }

    fn rewrite_call_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        function: &Arc<FunctionSymbol>,
        arguments: &[Arc<BoundExpression>],
    ) -> Arc<BoundExpression> {
        match self.rewrite_expressions(arguments) {
            Some(arguments) => Arc::new(BoundExpression::Call {
                function: function.clone(),
                arguments,
            }),
            None => node.clone(),
        }
    }

    fn rewrite_cast_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        type_clause: &TypeClause,
        expression: &Arc<BoundExpression>,
    ) -> Arc<BoundExpression> {
        let new_expression = self.rewrite_expression(expression);
        if same(&new_expression, expression) {
            return node.clone();
        }
        let constant: Option<BoundConstant> = fold_cast(type_clause, &new_expression);
        Arc::new(BoundExpression::Cast {
            type_clause: *type_clause,
            expression: new_expression,
            constant,
        })
    }

    fn rewrite_index_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        operand: &Arc<BoundExpression>,
        index: &Arc<BoundExpression>,
        type_clause: &TypeClause,
    ) -> Arc<BoundExpression> {
        let new_operand = self.rewrite_expression(operand);
        let new_index = self.rewrite_expression(index);
        if same(&new_operand, operand) && same(&new_index, index) {
            return node.clone();
        }
        Arc::new(BoundExpression::Index {
            operand: new_operand,
            index: new_index,
            type_clause: *type_clause,
        })
    }

    fn rewrite_initializer_list_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        items: &[Arc<BoundExpression>],
        type_clause: &TypeClause,
    ) -> Arc<BoundExpression> {
        match self.rewrite_expressions(items) {
            Some(items) => Arc::new(BoundExpression::InitializerList {
                items,
                type_clause: *type_clause,
            }),
            None => node.clone(),
        }
    }

    fn rewrite_inline_function_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        body: &Arc<BoundBlockStatement>,
        return_type: &TypeClause,
    ) -> Arc<BoundExpression> {
        let new_body = self.rewrite_block(body);
        if same(&new_body, body) {
            return node.clone();
        }
        Arc::new(BoundExpression::InlineFunction {
            body: new_body,
            return_type: *return_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buckle_ast::SyntaxKind;
    use buckle_bound::{Value, VariableKind};

    struct Identity;

    impl BoundTreeRewriter for Identity {}

    /// Replaces every int literal `1` with `2`.
    struct OneToTwo;

    impl BoundTreeRewriter for OneToTwo {
        fn rewrite_expression(&mut self, node: &Arc<BoundExpression>) -> Arc<BoundExpression> {
            if let BoundExpression::Literal { value: Value::Int(1), .. } = &**node {
                return Arc::new(BoundExpression::literal(Value::Int(2)));
            }
            match &**node {
                BoundExpression::Binary { left, operator, right, .. } => {
                    self.rewrite_binary_expression(node, left, *operator, right)
                }
                _ => node.clone(),
            }
        }
    }

    fn sample() -> Arc<BoundStatement> {
        let x = VariableSymbol::new("x", TypeClause::INT, VariableKind::Local, None);
        let add = BoundBinaryOperator::bind(SyntaxKind::PlusToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        let sum = Arc::new(BoundExpression::Binary {
            left: Arc::new(BoundExpression::literal(Value::Int(1))),
            operator: add,
            right: Arc::new(BoundExpression::literal(Value::Int(5))),
            constant: Some(BoundConstant::new(Value::Int(6))),
        });
        Arc::new(BoundStatement::block(vec![
            Arc::new(BoundStatement::VariableDeclaration { variable: x.clone(), initializer: Some(sum) }),
            Arc::new(BoundStatement::Expression {
                expression: Arc::new(BoundExpression::Variable { variable: x }),
            }),
        ]))
    }

    #[test]
    fn test_unchanged_tree_is_returned_by_identity() {
        let tree = sample();
        let rewritten = Identity.rewrite_statement(&tree);
        assert!(Arc::ptr_eq(&tree, &rewritten));
    }

    #[test]
    fn test_changed_child_rebuilds_only_its_spine() {
        let tree = sample();
        let rewritten = OneToTwo.rewrite_statement(&tree);
        assert!(!Arc::ptr_eq(&tree, &rewritten));

        let (BoundStatement::Block(old), BoundStatement::Block(new)) = (&*tree, &*rewritten) else {
            panic!("expected blocks");
        };
        assert!(!Arc::ptr_eq(&old.statements[0], &new.statements[0]));
        assert!(Arc::ptr_eq(&old.statements[1], &new.statements[1]));

        let BoundStatement::VariableDeclaration { initializer: Some(initializer), .. } = &*new.statements[0] else {
            panic!("expected declaration");
        };
        assert_eq!(initializer.constant(), Some(BoundConstant::new(Value::Int(7))));
    }

    #[test]
    fn test_compound_assignment_is_desugared() {
        let x = VariableSymbol::new("x", TypeClause::INT, VariableKind::Local, None);
        let add = BoundBinaryOperator::bind(SyntaxKind::PlusToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        let compound = Arc::new(BoundExpression::CompoundAssignment {
            variable: x.clone(),
            operator: add,
            expression: Arc::new(BoundExpression::literal(Value::Int(3))),
        });
        let rewritten = Identity.rewrite_expression(&compound);
        let BoundExpression::Assignment { variable, expression } = &*rewritten else {
            panic!("expected assignment");
        };
        assert_eq!(variable, &x);
        assert_eq!(expression.to_string(), "x + 3");

        let again = Identity.rewrite_expression(&rewritten);
        assert!(Arc::ptr_eq(&again, &rewritten));
    }
}
