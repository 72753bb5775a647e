//! Lowering to label/goto form.
//!
//! `if`, `while`, `do while` and `for` become labels, gotos and conditional
//! gotos; nested blocks are flattened so that every body the graph builder
//! and the evaluator see is one flat list of statements. `try` bodies and
//! inline-function bodies are lowered into flat blocks of their own.

use crate::rewriter::BoundTreeRewriter;
use buckle_bound::{
    BoundBlockStatement, BoundExpression, BoundLabel, BoundStatement, TypeClause, Value,
};
use buckle_diagnostics::InternalError;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Lowerer {
    label_count: usize,
}

impl Lowerer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower a function body. A `void` body that can fall off its end gets a
    /// trailing `return`.
    pub fn lower(&mut self, body: &Arc<BoundStatement>, return_type: &TypeClause) -> Arc<BoundBlockStatement> {
        let rewritten = self.rewrite_statement(body);
        let block = flatten(&rewritten);
        let falls_through = !matches!(
            block.statements.last().map(|statement| &**statement),
            Some(BoundStatement::Return { .. })
        );
        debug!(labels = self.label_count, statements = block.statements.len(), "lowered body");
        if return_type.is_void() && falls_through {
            let mut statements = block.statements.clone();
            statements.push(Arc::new(BoundStatement::Return { expression: None }));
            return Arc::new(BoundBlockStatement::new(statements));
        }
        block
    }

    /// Check that only lowered statement kinds remain.
    pub fn verify(block: &BoundBlockStatement) -> Result<(), InternalError> {
        for statement in &block.statements {
            match &**statement {
                BoundStatement::VariableDeclaration { .. }
                | BoundStatement::Expression { .. }
                | BoundStatement::Label(_)
                | BoundStatement::Goto(_)
                | BoundStatement::ConditionalGoto { .. }
                | BoundStatement::Return { .. }
                | BoundStatement::Nop => {}
                BoundStatement::Try { body, catch_body, finally_body } => {
                    Self::verify(body)?;
                    for inner in [catch_body, finally_body].into_iter().flatten() {
                        Self::verify(inner)?;
                    }
                }
                other => {
                    return Err(InternalError::UnexpectedStatement {
                        kind: other.kind().as_str(),
                        stage: "lowering",
                    })
                }
            }
        }
        Ok(())
    }

    fn generate_label(&mut self) -> BoundLabel {
        self.label_count += 1;
        BoundLabel::new(format!("Label{}", self.label_count))
    }

    fn lower_block(&mut self, block: &Arc<BoundBlockStatement>) -> Arc<BoundBlockStatement> {
        let rewritten = self.rewrite_block(block);
        flatten_block(&rewritten)
    }
}

fn goto_false(label: &BoundLabel, condition: &Arc<BoundExpression>) -> Arc<BoundStatement> {
    Arc::new(BoundStatement::ConditionalGoto {
        label: label.clone(),
        condition: condition.clone(),
        jump_if_true: false,
    })
}

fn goto_true(label: &BoundLabel, condition: &Arc<BoundExpression>) -> Arc<BoundStatement> {
    Arc::new(BoundStatement::ConditionalGoto {
        label: label.clone(),
        condition: condition.clone(),
        jump_if_true: true,
    })
}

fn label(label: &BoundLabel) -> Arc<BoundStatement> {
    Arc::new(BoundStatement::Label(label.clone()))
}

fn goto(label: &BoundLabel) -> Arc<BoundStatement> {
    Arc::new(BoundStatement::Goto(label.clone()))
}

fn flatten(statement: &Arc<BoundStatement>) -> Arc<BoundBlockStatement> {
    match &**statement {
        BoundStatement::Block(block) => flatten_block(block),
        _ => Arc::new(BoundBlockStatement::new(vec![statement.clone()])),
    }
}

/// Inline nested blocks. An already flat block is returned as is.
fn flatten_block(block: &Arc<BoundBlockStatement>) -> Arc<BoundBlockStatement> {
    if !block.statements.iter().any(|statement| matches!(**statement, BoundStatement::Block(_))) {
        return block.clone();
    }
    let mut statements = Vec::with_capacity(block.statements.len());
    let mut stack: Vec<Arc<BoundStatement>> = block.statements.iter().rev().cloned().collect();
    while let Some(current) = stack.pop() {
        if let BoundStatement::Block(inner) = &*current {
            stack.extend(inner.statements.iter().rev().cloned());
        } else {
            statements.push(current);
        }
    }
    Arc::new(BoundBlockStatement::new(statements))
}

impl BoundTreeRewriter for Lowerer {
    /// if <condition>
    ///     <then>
    /// else
    ///     <else>
    ///
    /// becomes
    ///
    /// gotoFalse <condition> else
    /// <then>
    /// goto end
    /// else:
    /// <else>
    /// end:
    fn rewrite_if_statement(
        &mut self,
        _node: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        then: &Arc<BoundStatement>,
        else_statement: Option<&Arc<BoundStatement>>,
    ) -> Arc<BoundStatement> {
        let lowered = match else_statement {
            None => {
                let end = self.generate_label();
                BoundStatement::block(vec![goto_false(&end, condition), then.clone(), label(&end)])
            }
            Some(else_statement) => {
                let else_label = self.generate_label();
                let end = self.generate_label();
                BoundStatement::block(vec![
                    goto_false(&else_label, condition),
                    then.clone(),
                    goto(&end),
                    label(&else_label),
                    else_statement.clone(),
                    label(&end),
                ])
            }
        };
        self.rewrite_statement(&Arc::new(lowered))
    }

    /// goto continue
    /// body:
    /// <body>
    /// continue:
    /// gotoTrue <condition> body
    /// break:
    fn rewrite_while_statement(
        &mut self,
        _node: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        body: &Arc<BoundStatement>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let body_label = self.generate_label();
        let lowered = BoundStatement::block(vec![
            goto(continue_label),
            label(&body_label),
            body.clone(),
            label(continue_label),
            goto_true(&body_label, condition),
            label(break_label),
        ]);
        self.rewrite_statement(&Arc::new(lowered))
    }

    /// body:
    /// <body>
    /// continue:
    /// gotoTrue <condition> body
    /// break:
    fn rewrite_do_while_statement(
        &mut self,
        _node: &Arc<BoundStatement>,
        body: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let body_label = self.generate_label();
        let lowered = BoundStatement::block(vec![
            label(&body_label),
            body.clone(),
            label(continue_label),
            goto_true(&body_label, condition),
            label(break_label),
        ]);
        self.rewrite_statement(&Arc::new(lowered))
    }

    /// {
    ///     <initializer>
    ///     while (<condition>) {
    ///         <body>
    ///         continue:
    ///         <step>
    ///     }
    /// }
    fn rewrite_for_statement(
        &mut self,
        _node: &Arc<BoundStatement>,
        initializer: &Arc<BoundStatement>,
        condition: &Arc<BoundExpression>,
        step: &Arc<BoundExpression>,
        body: &Arc<BoundStatement>,
        break_label: &BoundLabel,
        continue_label: &BoundLabel,
    ) -> Arc<BoundStatement> {
        let mut loop_body = vec![body.clone(), label(continue_label)];
        if !matches!(**step, BoundExpression::Empty) {
            loop_body.push(Arc::new(BoundStatement::Expression { expression: step.clone() }));
        }
        let while_statement = Arc::new(BoundStatement::While {
            condition: condition.clone(),
            body: Arc::new(BoundStatement::block(loop_body)),
            break_label: break_label.clone(),
            continue_label: self.generate_label(),
        });
        let lowered = BoundStatement::block(vec![initializer.clone(), while_statement]);
        self.rewrite_statement(&Arc::new(lowered))
    }

    /// A conditional goto on a constant becomes a plain goto or a no-op.
    fn rewrite_conditional_goto_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        label: &BoundLabel,
        condition: &Arc<BoundExpression>,
        jump_if_true: bool,
    ) -> Arc<BoundStatement> {
        if let Some(constant) = condition.constant() {
            let value = matches!(constant.value, Value::Bool(true));
            if value == jump_if_true {
                return goto(label);
            }
            return Arc::new(BoundStatement::Nop);
        }
        let new_condition = self.rewrite_expression(condition);
        if Arc::ptr_eq(&new_condition, condition) {
            return node.clone();
        }
        Arc::new(BoundStatement::ConditionalGoto {
            label: label.clone(),
            condition: new_condition,
            jump_if_true,
        })
    }

    fn rewrite_try_statement(
        &mut self,
        node: &Arc<BoundStatement>,
        body: &Arc<BoundBlockStatement>,
        catch_body: Option<&Arc<BoundBlockStatement>>,
        finally_body: Option<&Arc<BoundBlockStatement>>,
    ) -> Arc<BoundStatement> {
        let new_body = self.lower_block(body);
        let new_catch = catch_body.map(|block| self.lower_block(block));
        let new_finally = finally_body.map(|block| self.lower_block(block));
        let unchanged = Arc::ptr_eq(&new_body, body)
            && new_catch.as_ref().map(Arc::as_ptr) == catch_body.map(Arc::as_ptr)
            && new_finally.as_ref().map(Arc::as_ptr) == finally_body.map(Arc::as_ptr);
        if unchanged {
            return node.clone();
        }
        Arc::new(BoundStatement::Try {
            body: new_body,
            catch_body: new_catch,
            finally_body: new_finally,
        })
    }

    fn rewrite_inline_function_expression(
        &mut self,
        node: &Arc<BoundExpression>,
        body: &Arc<BoundBlockStatement>,
        return_type: &TypeClause,
    ) -> Arc<BoundExpression> {
        let new_body = self.lower_block(body);
        if Arc::ptr_eq(&new_body, body) {
            return node.clone();
        }
        Arc::new(BoundExpression::InlineFunction {
            body: new_body,
            return_type: *return_type,
        })
    }
}
