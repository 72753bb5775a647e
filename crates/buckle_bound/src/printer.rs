//! Bound tree to text.
//!
//! Produces the C-like listing shown by `#showTree` and used as basic block
//! labels in the control-flow graph export.

use crate::symbols::FunctionSymbol;
use crate::tree::{BoundBlockStatement, BoundExpression, BoundStatement};
use crate::value::Value;
use std::fmt;

/// Writes bound nodes as indented source-like text.
pub struct BoundTreePrinter {
    output: String,
    indent_level: u32,
    at_line_start: bool,
}

impl Default for BoundTreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundTreePrinter {
    const INDENT: &'static str = "    ";

    pub fn new() -> Self {
        Self {
            output: String::with_capacity(1024),
            indent_level: 0,
            at_line_start: true,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, text: &str) {
        if self.at_line_start {
            for _ in 0..self.indent_level {
                self.output.push_str(Self::INDENT);
            }
            self.at_line_start = false;
        }
        self.output.push_str(text);
    }

    fn write_line(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn print_statement(&mut self, statement: &BoundStatement) {
        match statement {
            BoundStatement::Block(block) => self.print_block(block),
            BoundStatement::VariableDeclaration { variable, initializer } => {
                self.write(&format!("{} {}", variable.type_clause(), variable.name()));
                if let Some(initializer) = initializer {
                    self.write(" = ");
                    self.print_expression(initializer);
                }
                self.write(";");
                self.write_line();
            }
            BoundStatement::If { condition, then, else_statement } => {
                self.write("if (");
                self.print_expression(condition);
                self.write(")");
                self.write_line();
                self.print_nested(then);
                if let Some(else_statement) = else_statement {
                    self.write("else");
                    self.write_line();
                    self.print_nested(else_statement);
                }
            }
            BoundStatement::While { condition, body, .. } => {
                self.write("while (");
                self.print_expression(condition);
                self.write(")");
                self.write_line();
                self.print_nested(body);
            }
            BoundStatement::DoWhile { body, condition, .. } => {
                self.write("do");
                self.write_line();
                self.print_nested(body);
                self.write("while (");
                self.print_expression(condition);
                self.write(");");
                self.write_line();
            }
            BoundStatement::For { initializer, condition, step, body, .. } => {
                self.write("for (");
                let mut header = BoundTreePrinter::new();
                header.print_statement(initializer);
                self.write(header.finish().trim_end());
                self.write(" ");
                self.print_expression(condition);
                self.write("; ");
                self.print_expression(step);
                self.write(")");
                self.write_line();
                self.print_nested(body);
            }
            BoundStatement::Expression { expression } => {
                self.print_expression(expression);
                self.write(";");
                self.write_line();
            }
            BoundStatement::Label(label) => {
                let saved = self.indent_level;
                self.indent_level = self.indent_level.saturating_sub(1);
                self.write(&format!("{}:", label));
                self.write_line();
                self.indent_level = saved;
            }
            BoundStatement::Goto(label) => {
                self.write(&format!("goto {};", label));
                self.write_line();
            }
            BoundStatement::ConditionalGoto { label, condition, jump_if_true } => {
                let keyword = if *jump_if_true { "if" } else { "unless" };
                self.write(&format!("goto {} {} (", label, keyword));
                self.print_expression(condition);
                self.write(");");
                self.write_line();
            }
            BoundStatement::Return { expression } => {
                self.write("return");
                if let Some(expression) = expression {
                    self.write(" ");
                    self.print_expression(expression);
                }
                self.write(";");
                self.write_line();
            }
            BoundStatement::Try { body, catch_body, finally_body } => {
                self.write("try");
                self.write_line();
                self.print_block(body);
                if let Some(catch_body) = catch_body {
                    self.write("catch");
                    self.write_line();
                    self.print_block(catch_body);
                }
                if let Some(finally_body) = finally_body {
                    self.write("finally");
                    self.write_line();
                    self.print_block(finally_body);
                }
            }
            BoundStatement::Nop => {
                self.write("nop;");
                self.write_line();
            }
        }
    }

    pub fn print_block(&mut self, block: &BoundBlockStatement) {
        self.write("{");
        self.write_line();
        self.indent_level += 1;
        for statement in &block.statements {
            self.print_statement(statement);
        }
        self.indent_level -= 1;
        self.write("}");
        self.write_line();
    }

    /// A function signature followed by its body.
    pub fn print_function(&mut self, function: &FunctionSymbol, body: &BoundBlockStatement) {
        self.write(&function.to_string());
        self.write(" ");
        self.print_block(body);
    }

    fn print_nested(&mut self, statement: &BoundStatement) {
        if let BoundStatement::Block(block) = statement {
            self.print_block(block);
        } else {
            self.indent_level += 1;
            self.print_statement(statement);
            self.indent_level -= 1;
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn print_expression(&mut self, expression: &BoundExpression) {
        match expression {
            BoundExpression::Literal { value, .. } => self.print_value(value),
            BoundExpression::Variable { variable } => self.write(variable.name()),
            BoundExpression::Assignment { variable, expression } => {
                self.write(variable.name());
                self.write(" = ");
                self.print_expression(expression);
            }
            BoundExpression::CompoundAssignment { variable, operator, expression } => {
                self.write(variable.name());
                self.write(&format!(" {}= ", operator.syntax_kind.text().unwrap_or("?")));
                self.print_expression(expression);
            }
            BoundExpression::Unary { operator, operand, .. } => {
                self.write(operator.syntax_kind.text().unwrap_or("?"));
                self.print_operand(operand);
            }
            BoundExpression::Binary { left, operator, right, .. } => {
                self.print_operand(left);
                self.write(&format!(" {} ", operator.syntax_kind.text().unwrap_or("?")));
                self.print_operand(right);
            }
            BoundExpression::Call { function, arguments } => {
                self.write(function.name());
                self.write("(");
                self.print_list(arguments);
                self.write(")");
            }
            BoundExpression::Cast { type_clause, expression, .. } => {
                self.write(&format!("({})", type_clause));
                self.print_operand(expression);
            }
            BoundExpression::Index { operand, index, .. } => {
                self.print_operand(operand);
                self.write("[");
                self.print_expression(index);
                self.write("]");
            }
            BoundExpression::InitializerList { items, .. } => {
                self.write("{ ");
                self.print_list(items);
                self.write(" }");
            }
            BoundExpression::Reference { variable, .. } => {
                self.write("ref ");
                self.write(variable.name());
            }
            BoundExpression::InlineFunction { body, .. } => {
                self.write("{ ");
                let mut inner = BoundTreePrinter::new();
                for statement in &body.statements {
                    inner.print_statement(statement);
                }
                let text = inner.finish();
                self.write(&text.lines().map(str::trim).collect::<Vec<_>>().join(" "));
                self.write(" }");
            }
            BoundExpression::Empty => {}
            BoundExpression::Error => self.write("?"),
        }
    }

    fn print_operand(&mut self, operand: &BoundExpression) {
        let nested = matches!(
            operand,
            BoundExpression::Binary { .. }
                | BoundExpression::Assignment { .. }
                | BoundExpression::CompoundAssignment { .. }
        );
        if nested {
            self.write("(");
            self.print_expression(operand);
            self.write(")");
        } else {
            self.print_expression(operand);
        }
    }

    fn print_list(&mut self, items: &[std::sync::Arc<BoundExpression>]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expression(item);
        }
    }

    fn print_value(&mut self, value: &Value) {
        match value {
            Value::String(text) => {
                let escaped = text
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n")
                    .replace('\t', "\\t");
                self.write(&format!("\"{}\"", escaped));
            }
            other => self.write(&other.to_string()),
        }
    }
}

impl fmt::Display for BoundStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = BoundTreePrinter::new();
        printer.print_statement(self);
        f.write_str(&printer.finish())
    }
}

impl fmt::Display for BoundExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = BoundTreePrinter::new();
        printer.print_expression(self);
        f.write_str(&printer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::BoundBinaryOperator;
    use crate::symbols::{VariableKind, VariableSymbol};
    use crate::tree::BoundLabel;
    use crate::types::TypeClause;
    use buckle_ast::SyntaxKind;
    use std::sync::Arc;

    #[test]
    fn test_print_lowered_shape() {
        let x = VariableSymbol::new("x", TypeClause::INT, VariableKind::Global, None);
        let less = BoundBinaryOperator::bind(SyntaxKind::LessThanToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        let condition = Arc::new(BoundExpression::Binary {
            left: Arc::new(BoundExpression::Variable { variable: x.clone() }),
            operator: less,
            right: Arc::new(BoundExpression::literal(Value::Int(3))),
            constant: None,
        });
        let block = BoundBlockStatement::new(vec![
            Arc::new(BoundStatement::VariableDeclaration {
                variable: x,
                initializer: Some(Arc::new(BoundExpression::literal(Value::Int(0)))),
            }),
            Arc::new(BoundStatement::Label(BoundLabel::new("Label1"))),
            Arc::new(BoundStatement::ConditionalGoto {
                label: BoundLabel::new("Label1"),
                condition,
                jump_if_true: true,
            }),
            Arc::new(BoundStatement::Return { expression: None }),
        ]);
        let mut printer = BoundTreePrinter::new();
        printer.print_block(&block);
        assert_eq!(
            printer.finish(),
            "{\n    int x = 0;\nLabel1:\n    goto Label1 if (x < 3);\n    return;\n}\n"
        );
    }

    #[test]
    fn test_print_function() {
        let function = FunctionSymbol::new("F", Vec::new(), TypeClause::INT, None);
        let body = BoundBlockStatement::new(vec![Arc::new(BoundStatement::Return {
            expression: Some(Arc::new(BoundExpression::literal(Value::Int(1)))),
        })]);
        let mut printer = BoundTreePrinter::new();
        printer.print_function(&function, &body);
        assert_eq!(printer.finish(), "int F() {\n    return 1;\n}\n");
    }

    #[test]
    fn test_string_literal_is_escaped() {
        let literal = BoundExpression::literal(Value::from("a\"b\n"));
        assert_eq!(literal.to_string(), "\"a\\\"b\\n\"");
    }
}
