//! The bound node model.
//!
//! Bound nodes are immutable and shared through `Arc`. Passes that rewrite a
//! tree reuse unchanged children by pointer, so "did anything change" is an
//! `Arc::ptr_eq` check rather than a deep comparison.

use crate::operators::{BoundBinaryOperator, BoundUnaryOperator};
use crate::symbols::{FunctionSymbol, VariableSymbol};
use crate::types::{TypeClause, TypeFlags, TypeSymbol};
use crate::value::{BoundConstant, Value};
use std::fmt;
use std::sync::Arc;

/// Tag of every bound node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundNodeKind {
    // Expressions
    LiteralExpression,
    VariableExpression,
    AssignmentExpression,
    CompoundAssignmentExpression,
    UnaryExpression,
    BinaryExpression,
    CallExpression,
    CastExpression,
    IndexExpression,
    InitializerListExpression,
    ReferenceExpression,
    InlineFunctionExpression,
    EmptyExpression,
    ErrorExpression,

    // Statements
    BlockStatement,
    VariableDeclarationStatement,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ExpressionStatement,
    LabelStatement,
    GotoStatement,
    ConditionalGotoStatement,
    ReturnStatement,
    TryStatement,
    NopStatement,
}

impl BoundNodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LiteralExpression => "LiteralExpression",
            Self::VariableExpression => "VariableExpression",
            Self::AssignmentExpression => "AssignmentExpression",
            Self::CompoundAssignmentExpression => "CompoundAssignmentExpression",
            Self::UnaryExpression => "UnaryExpression",
            Self::BinaryExpression => "BinaryExpression",
            Self::CallExpression => "CallExpression",
            Self::CastExpression => "CastExpression",
            Self::IndexExpression => "IndexExpression",
            Self::InitializerListExpression => "InitializerListExpression",
            Self::ReferenceExpression => "ReferenceExpression",
            Self::InlineFunctionExpression => "InlineFunctionExpression",
            Self::EmptyExpression => "EmptyExpression",
            Self::ErrorExpression => "ErrorExpression",
            Self::BlockStatement => "BlockStatement",
            Self::VariableDeclarationStatement => "VariableDeclarationStatement",
            Self::IfStatement => "IfStatement",
            Self::WhileStatement => "WhileStatement",
            Self::DoWhileStatement => "DoWhileStatement",
            Self::ForStatement => "ForStatement",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::LabelStatement => "LabelStatement",
            Self::GotoStatement => "GotoStatement",
            Self::ConditionalGotoStatement => "ConditionalGotoStatement",
            Self::ReturnStatement => "ReturnStatement",
            Self::TryStatement => "TryStatement",
            Self::NopStatement => "NopStatement",
        }
    }
}

impl fmt::Display for BoundNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundLabel(pub String);

impl BoundLabel {
    pub fn new(name: impl Into<String>) -> Self {
        BoundLabel(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub enum BoundExpression {
    Literal {
        type_clause: TypeClause,
        value: Value,
    },
    Variable {
        variable: Arc<VariableSymbol>,
    },
    Assignment {
        variable: Arc<VariableSymbol>,
        expression: Arc<BoundExpression>,
    },
    CompoundAssignment {
        variable: Arc<VariableSymbol>,
        operator: &'static BoundBinaryOperator,
        expression: Arc<BoundExpression>,
    },
    Unary {
        operator: &'static BoundUnaryOperator,
        operand: Arc<BoundExpression>,
        constant: Option<BoundConstant>,
    },
    Binary {
        left: Arc<BoundExpression>,
        operator: &'static BoundBinaryOperator,
        right: Arc<BoundExpression>,
        constant: Option<BoundConstant>,
    },
    Call {
        function: Arc<FunctionSymbol>,
        arguments: Vec<Arc<BoundExpression>>,
    },
    Cast {
        type_clause: TypeClause,
        expression: Arc<BoundExpression>,
        constant: Option<BoundConstant>,
    },
    Index {
        operand: Arc<BoundExpression>,
        index: Arc<BoundExpression>,
        /// Element type of the operand.
        type_clause: TypeClause,
    },
    InitializerList {
        items: Vec<Arc<BoundExpression>>,
        type_clause: TypeClause,
    },
    Reference {
        variable: Arc<VariableSymbol>,
        type_clause: TypeClause,
    },
    InlineFunction {
        body: Arc<BoundBlockStatement>,
        return_type: TypeClause,
    },
    Empty,
    Error,
}

impl BoundExpression {
    pub fn literal(value: Value) -> Self {
        let type_clause = match &value {
            Value::Null => TypeClause::new(TypeSymbol::Any, TypeFlags::NULLABLE | TypeFlags::LITERAL, 0),
            Value::Bool(_) => TypeClause::literal(TypeSymbol::Bool),
            Value::Int(_) => TypeClause::literal(TypeSymbol::Int),
            Value::Decimal(_) => TypeClause::literal(TypeSymbol::Decimal),
            Value::String(_) => TypeClause::literal(TypeSymbol::String),
            Value::Array(_) => TypeClause::literal(TypeSymbol::Any).with_dimensions(1),
        };
        BoundExpression::Literal { type_clause, value }
    }

    pub fn kind(&self) -> BoundNodeKind {
        match self {
            BoundExpression::Literal { .. } => BoundNodeKind::LiteralExpression,
            BoundExpression::Variable { .. } => BoundNodeKind::VariableExpression,
            BoundExpression::Assignment { .. } => BoundNodeKind::AssignmentExpression,
            BoundExpression::CompoundAssignment { .. } => BoundNodeKind::CompoundAssignmentExpression,
            BoundExpression::Unary { .. } => BoundNodeKind::UnaryExpression,
            BoundExpression::Binary { .. } => BoundNodeKind::BinaryExpression,
            BoundExpression::Call { .. } => BoundNodeKind::CallExpression,
            BoundExpression::Cast { .. } => BoundNodeKind::CastExpression,
            BoundExpression::Index { .. } => BoundNodeKind::IndexExpression,
            BoundExpression::InitializerList { .. } => BoundNodeKind::InitializerListExpression,
            BoundExpression::Reference { .. } => BoundNodeKind::ReferenceExpression,
            BoundExpression::InlineFunction { .. } => BoundNodeKind::InlineFunctionExpression,
            BoundExpression::Empty => BoundNodeKind::EmptyExpression,
            BoundExpression::Error => BoundNodeKind::ErrorExpression,
        }
    }

    /// The resolved type of the expression.
    pub fn type_clause(&self) -> TypeClause {
        match self {
            BoundExpression::Literal { type_clause, .. }
            | BoundExpression::Cast { type_clause, .. }
            | BoundExpression::Index { type_clause, .. }
            | BoundExpression::InitializerList { type_clause, .. }
            | BoundExpression::Reference { type_clause, .. } => *type_clause,
            BoundExpression::Variable { variable }
            | BoundExpression::Assignment { variable, .. }
            | BoundExpression::CompoundAssignment { variable, .. } => variable.type_clause(),
            BoundExpression::Unary { operator, .. } => operator.type_clause,
            BoundExpression::Binary { operator, .. } => operator.type_clause,
            BoundExpression::Call { function, .. } => function.type_clause(),
            BoundExpression::InlineFunction { return_type, .. } => *return_type,
            BoundExpression::Empty => TypeClause::VOID,
            BoundExpression::Error => TypeClause::ERROR,
        }
    }

    /// The compile-time value, if the expression is constant.
    pub fn constant(&self) -> Option<BoundConstant> {
        match self {
            BoundExpression::Literal { value, .. } => Some(BoundConstant::new(value.clone())),
            BoundExpression::Variable { variable } => variable.constant().cloned(),
            BoundExpression::Unary { constant, .. }
            | BoundExpression::Binary { constant, .. }
            | BoundExpression::Cast { constant, .. } => constant.clone(),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, BoundExpression::Literal { value: Value::Null, .. })
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Default)]
pub struct BoundBlockStatement {
    pub statements: Vec<Arc<BoundStatement>>,
}

impl BoundBlockStatement {
    pub fn new(statements: Vec<Arc<BoundStatement>>) -> Self {
        Self { statements }
    }
}

#[derive(Debug)]
pub enum BoundStatement {
    Block(Arc<BoundBlockStatement>),
    VariableDeclaration {
        variable: Arc<VariableSymbol>,
        initializer: Option<Arc<BoundExpression>>,
    },
    If {
        condition: Arc<BoundExpression>,
        then: Arc<BoundStatement>,
        else_statement: Option<Arc<BoundStatement>>,
    },
    While {
        condition: Arc<BoundExpression>,
        body: Arc<BoundStatement>,
        break_label: BoundLabel,
        continue_label: BoundLabel,
    },
    DoWhile {
        body: Arc<BoundStatement>,
        condition: Arc<BoundExpression>,
        break_label: BoundLabel,
        continue_label: BoundLabel,
    },
    For {
        initializer: Arc<BoundStatement>,
        condition: Arc<BoundExpression>,
        step: Arc<BoundExpression>,
        body: Arc<BoundStatement>,
        break_label: BoundLabel,
        continue_label: BoundLabel,
    },
    Expression {
        expression: Arc<BoundExpression>,
    },
    Label(BoundLabel),
    Goto(BoundLabel),
    ConditionalGoto {
        label: BoundLabel,
        condition: Arc<BoundExpression>,
        jump_if_true: bool,
    },
    Return {
        expression: Option<Arc<BoundExpression>>,
    },
    Try {
        body: Arc<BoundBlockStatement>,
        catch_body: Option<Arc<BoundBlockStatement>>,
        finally_body: Option<Arc<BoundBlockStatement>>,
    },
    Nop,
}

impl BoundStatement {
    pub fn kind(&self) -> BoundNodeKind {
        match self {
            BoundStatement::Block(_) => BoundNodeKind::BlockStatement,
            BoundStatement::VariableDeclaration { .. } => BoundNodeKind::VariableDeclarationStatement,
            BoundStatement::If { .. } => BoundNodeKind::IfStatement,
            BoundStatement::While { .. } => BoundNodeKind::WhileStatement,
            BoundStatement::DoWhile { .. } => BoundNodeKind::DoWhileStatement,
            BoundStatement::For { .. } => BoundNodeKind::ForStatement,
            BoundStatement::Expression { .. } => BoundNodeKind::ExpressionStatement,
            BoundStatement::Label(_) => BoundNodeKind::LabelStatement,
            BoundStatement::Goto(_) => BoundNodeKind::GotoStatement,
            BoundStatement::ConditionalGoto { .. } => BoundNodeKind::ConditionalGotoStatement,
            BoundStatement::Return { .. } => BoundNodeKind::ReturnStatement,
            BoundStatement::Try { .. } => BoundNodeKind::TryStatement,
            BoundStatement::Nop => BoundNodeKind::NopStatement,
        }
    }

    pub fn block(statements: Vec<Arc<BoundStatement>>) -> Self {
        BoundStatement::Block(Arc::new(BoundBlockStatement::new(statements)))
    }
}
