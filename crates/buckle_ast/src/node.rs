//! Syntax node definitions.
//!
//! Nodes are allocated in a `bumpalo::Bump` owned by the caller of the
//! parser; children are arena references and lists are arena slices.

use crate::syntax_kind::SyntaxKind;
use buckle_core::text::TextSpan;

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Token
// ============================================================================

/// The decoded value of a literal token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue<'a> {
    None,
    Int(i64),
    Decimal(f64),
    String(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    /// Source text of the token. Empty for synthesized tokens.
    pub text: &'a str,
    pub value: TokenValue<'a>,
    /// Synthesized by the parser to recover from a missing token.
    pub is_missing: bool,
}

impl<'a> Token<'a> {
    pub fn new(kind: SyntaxKind, span: TextSpan, text: &'a str) -> Self {
        Self {
            kind,
            span,
            text,
            value: TokenValue::None,
            is_missing: false,
        }
    }

    pub fn missing(kind: SyntaxKind, pos: u32) -> Self {
        Self {
            kind,
            span: TextSpan::empty(pos),
            text: "",
            value: TokenValue::None,
            is_missing: true,
        }
    }
}

// ============================================================================
// Compilation unit and members
// ============================================================================

#[derive(Debug)]
pub struct CompilationUnit<'a> {
    pub members: NodeList<'a, Member<'a>>,
    pub end_of_file_token: Token<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Function(&'a FunctionDeclaration<'a>),
    GlobalStatement(&'a Statement<'a>),
}

impl<'a> Member<'a> {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Member::Function(_) => SyntaxKind::FunctionDeclaration,
            Member::GlobalStatement(_) => SyntaxKind::GlobalStatement,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Member::Function(function) => function.span(),
            Member::GlobalStatement(statement) => statement.span(),
        }
    }
}

#[derive(Debug)]
pub struct FunctionDeclaration<'a> {
    pub return_type: &'a TypeClauseSyntax<'a>,
    pub identifier: Token<'a>,
    pub open_paren: Token<'a>,
    pub parameters: NodeList<'a, Parameter<'a>>,
    pub close_paren: Token<'a>,
    pub body: &'a BlockStatement<'a>,
}

impl<'a> FunctionDeclaration<'a> {
    pub fn span(&self) -> TextSpan {
        self.return_type.span().union(&self.body.close_brace.span)
    }
}

#[derive(Debug)]
pub struct Parameter<'a> {
    pub type_clause: &'a TypeClauseSyntax<'a>,
    pub identifier: Token<'a>,
}

impl<'a> Parameter<'a> {
    pub fn span(&self) -> TextSpan {
        self.type_clause.span().union(&self.identifier.span)
    }
}

/// `[NotNull] const ref const int[][]`
#[derive(Debug)]
pub struct TypeClauseSyntax<'a> {
    /// Identifiers written inside `[...]` before the type.
    pub attributes: NodeList<'a, Token<'a>>,
    /// `const` before `ref`: the reference itself is constant.
    pub const_ref_keyword: Option<Token<'a>>,
    pub ref_keyword: Option<Token<'a>>,
    pub const_keyword: Option<Token<'a>>,
    /// An identifier, or one of `auto`, `var`, `let`.
    pub type_name: Token<'a>,
    /// One `(open, close)` bracket pair per array dimension.
    pub brackets: NodeList<'a, (Token<'a>, Token<'a>)>,
    pub start: u32,
}

impl<'a> TypeClauseSyntax<'a> {
    pub fn span(&self) -> TextSpan {
        let end = self
            .brackets
            .last()
            .map(|(_, close)| close.span.end())
            .unwrap_or(self.type_name.span.end());
        TextSpan::from_bounds(self.start, end.max(self.start))
    }

    pub fn dimensions(&self) -> u32 {
        self.brackets.len() as u32
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug)]
pub enum Statement<'a> {
    Block(BlockStatement<'a>),
    VariableDeclaration(VariableDeclarationStatement<'a>),
    If(IfStatement<'a>),
    While(WhileStatement<'a>),
    DoWhile(DoWhileStatement<'a>),
    For(ForStatement<'a>),
    Break(KeywordStatement<'a>),
    Continue(KeywordStatement<'a>),
    Return(ReturnStatement<'a>),
    Try(TryStatement<'a>),
    Expression(ExpressionStatement<'a>),
    Empty(Token<'a>),
    LocalFunction(&'a FunctionDeclaration<'a>),
}

impl<'a> Statement<'a> {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Statement::Block(_) => SyntaxKind::BlockStatement,
            Statement::VariableDeclaration(_) => SyntaxKind::VariableDeclarationStatement,
            Statement::If(_) => SyntaxKind::IfStatement,
            Statement::While(_) => SyntaxKind::WhileStatement,
            Statement::DoWhile(_) => SyntaxKind::DoWhileStatement,
            Statement::For(_) => SyntaxKind::ForStatement,
            Statement::Break(_) => SyntaxKind::BreakStatement,
            Statement::Continue(_) => SyntaxKind::ContinueStatement,
            Statement::Return(_) => SyntaxKind::ReturnStatement,
            Statement::Try(_) => SyntaxKind::TryStatement,
            Statement::Expression(_) => SyntaxKind::ExpressionStatement,
            Statement::Empty(_) => SyntaxKind::EmptyStatement,
            Statement::LocalFunction(_) => SyntaxKind::LocalFunctionStatement,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Statement::Block(block) => block.span(),
            Statement::VariableDeclaration(declaration) => {
                declaration.type_clause.span().union(&declaration.semicolon.span)
            }
            Statement::If(statement) => {
                let end = match &statement.else_clause {
                    Some(else_clause) => else_clause.body.span(),
                    None => statement.then.span(),
                };
                statement.keyword.span.union(&end)
            }
            Statement::While(statement) => statement.keyword.span.union(&statement.body.span()),
            Statement::DoWhile(statement) => statement.do_keyword.span.union(&statement.semicolon.span),
            Statement::For(statement) => statement.keyword.span.union(&statement.body.span()),
            Statement::Break(statement) | Statement::Continue(statement) => {
                statement.keyword.span.union(&statement.semicolon.span)
            }
            Statement::Return(statement) => statement.keyword.span.union(&statement.semicolon.span),
            Statement::Try(statement) => {
                let end = statement
                    .finally_clause
                    .as_ref()
                    .map(|clause| clause.body.span())
                    .or_else(|| statement.catch_clause.as_ref().map(|clause| clause.body.span()))
                    .unwrap_or_else(|| statement.body.span());
                statement.keyword.span.union(&end)
            }
            Statement::Expression(statement) => statement.expression.span().union(&statement.semicolon.span),
            Statement::Empty(semicolon) => semicolon.span,
            Statement::LocalFunction(function) => function.span(),
        }
    }
}

#[derive(Debug)]
pub struct BlockStatement<'a> {
    pub open_brace: Token<'a>,
    pub statements: NodeList<'a, &'a Statement<'a>>,
    pub close_brace: Token<'a>,
}

impl<'a> BlockStatement<'a> {
    pub fn span(&self) -> TextSpan {
        self.open_brace.span.union(&self.close_brace.span)
    }
}

#[derive(Debug)]
pub struct VariableDeclarationStatement<'a> {
    pub type_clause: &'a TypeClauseSyntax<'a>,
    pub identifier: Token<'a>,
    pub equals: Option<Token<'a>>,
    pub initializer: Option<&'a Expression<'a>>,
    pub semicolon: Token<'a>,
}

#[derive(Debug)]
pub struct IfStatement<'a> {
    pub keyword: Token<'a>,
    pub open_paren: Token<'a>,
    pub condition: &'a Expression<'a>,
    pub close_paren: Token<'a>,
    pub then: &'a Statement<'a>,
    pub else_clause: Option<ElseClause<'a>>,
}

#[derive(Debug)]
pub struct ElseClause<'a> {
    pub keyword: Token<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug)]
pub struct WhileStatement<'a> {
    pub keyword: Token<'a>,
    pub open_paren: Token<'a>,
    pub condition: &'a Expression<'a>,
    pub close_paren: Token<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug)]
pub struct DoWhileStatement<'a> {
    pub do_keyword: Token<'a>,
    pub body: &'a Statement<'a>,
    pub while_keyword: Token<'a>,
    pub open_paren: Token<'a>,
    pub condition: &'a Expression<'a>,
    pub close_paren: Token<'a>,
    pub semicolon: Token<'a>,
}

/// `for (initializer condition; step) body`. The initializer is a full
/// statement and owns its semicolon.
#[derive(Debug)]
pub struct ForStatement<'a> {
    pub keyword: Token<'a>,
    pub open_paren: Token<'a>,
    pub initializer: &'a Statement<'a>,
    pub condition: &'a Expression<'a>,
    pub semicolon: Token<'a>,
    pub step: &'a Expression<'a>,
    pub close_paren: Token<'a>,
    pub body: &'a Statement<'a>,
}

/// `break;` and `continue;`
#[derive(Debug)]
pub struct KeywordStatement<'a> {
    pub keyword: Token<'a>,
    pub semicolon: Token<'a>,
}

#[derive(Debug)]
pub struct ReturnStatement<'a> {
    pub keyword: Token<'a>,
    pub expression: Option<&'a Expression<'a>>,
    pub semicolon: Token<'a>,
}

#[derive(Debug)]
pub struct TryStatement<'a> {
    pub keyword: Token<'a>,
    pub body: &'a BlockStatement<'a>,
    pub catch_clause: Option<CatchClause<'a>>,
    pub finally_clause: Option<FinallyClause<'a>>,
}

#[derive(Debug)]
pub struct CatchClause<'a> {
    pub keyword: Token<'a>,
    pub body: &'a BlockStatement<'a>,
}

#[derive(Debug)]
pub struct FinallyClause<'a> {
    pub keyword: Token<'a>,
    pub body: &'a BlockStatement<'a>,
}

#[derive(Debug)]
pub struct ExpressionStatement<'a> {
    pub expression: &'a Expression<'a>,
    pub semicolon: Token<'a>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub enum Expression<'a> {
    Literal(LiteralExpression<'a>),
    Name(NameExpression<'a>),
    Assignment(AssignmentExpression<'a>),
    CompoundAssignment(CompoundAssignmentExpression<'a>),
    Prefix(PrefixExpression<'a>),
    Unary(UnaryExpression<'a>),
    Binary(BinaryExpression<'a>),
    Parenthesized(ParenthesizedExpression<'a>),
    Call(CallExpression<'a>),
    Index(IndexExpression<'a>),
    InitializerList(InitializerListExpression<'a>),
    Reference(ReferenceExpression<'a>),
    InlineFunction(InlineFunctionExpression<'a>),
    Empty(TextSpan),
}

impl<'a> Expression<'a> {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Expression::Literal(_) => SyntaxKind::LiteralExpression,
            Expression::Name(_) => SyntaxKind::NameExpression,
            Expression::Assignment(_) => SyntaxKind::AssignmentExpression,
            Expression::CompoundAssignment(_) => SyntaxKind::CompoundAssignmentExpression,
            Expression::Prefix(_) => SyntaxKind::PrefixExpression,
            Expression::Unary(_) => SyntaxKind::UnaryExpression,
            Expression::Binary(_) => SyntaxKind::BinaryExpression,
            Expression::Parenthesized(_) => SyntaxKind::ParenthesizedExpression,
            Expression::Call(_) => SyntaxKind::CallExpression,
            Expression::Index(_) => SyntaxKind::IndexExpression,
            Expression::InitializerList(_) => SyntaxKind::InitializerListExpression,
            Expression::Reference(_) => SyntaxKind::ReferenceExpression,
            Expression::InlineFunction(_) => SyntaxKind::InlineFunctionExpression,
            Expression::Empty(_) => SyntaxKind::EmptyExpression,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Expression::Literal(literal) => literal.token.span,
            Expression::Name(name) => name.identifier.span,
            Expression::Assignment(assignment) => assignment.identifier.span.union(&assignment.expression.span()),
            Expression::CompoundAssignment(assignment) => {
                assignment.identifier.span.union(&assignment.expression.span())
            }
            Expression::Prefix(prefix) => prefix.operator.span.union(&prefix.identifier.span),
            Expression::Unary(unary) => unary.operator.span.union(&unary.operand.span()),
            Expression::Binary(binary) => binary.left.span().union(&binary.right.span()),
            Expression::Parenthesized(paren) => paren.open_paren.span.union(&paren.close_paren.span),
            Expression::Call(call) => call.identifier.span.union(&call.close_paren.span),
            Expression::Index(index) => index.operand.span().union(&index.close_bracket.span),
            Expression::InitializerList(list) => list.open_brace.span.union(&list.close_brace.span),
            Expression::Reference(reference) => reference.keyword.span.union(&reference.identifier.span),
            Expression::InlineFunction(inline) => inline.open_brace.span.union(&inline.close_brace.span),
            Expression::Empty(span) => *span,
        }
    }
}

#[derive(Debug)]
pub struct LiteralExpression<'a> {
    /// A numeric or string literal, or `true`, `false`, `null`.
    pub token: Token<'a>,
}

#[derive(Debug)]
pub struct NameExpression<'a> {
    pub identifier: Token<'a>,
}

#[derive(Debug)]
pub struct AssignmentExpression<'a> {
    pub identifier: Token<'a>,
    pub equals: Token<'a>,
    pub expression: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct CompoundAssignmentExpression<'a> {
    pub identifier: Token<'a>,
    /// One of the compound assignment tokens, e.g. `+=`.
    pub operator: Token<'a>,
    pub expression: &'a Expression<'a>,
}

/// `++x` and `--x`
#[derive(Debug)]
pub struct PrefixExpression<'a> {
    pub operator: Token<'a>,
    pub identifier: Token<'a>,
}

#[derive(Debug)]
pub struct UnaryExpression<'a> {
    pub operator: Token<'a>,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct BinaryExpression<'a> {
    pub left: &'a Expression<'a>,
    pub operator: Token<'a>,
    pub right: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct ParenthesizedExpression<'a> {
    pub open_paren: Token<'a>,
    pub expression: &'a Expression<'a>,
    pub close_paren: Token<'a>,
}

#[derive(Debug)]
pub struct CallExpression<'a> {
    pub identifier: Token<'a>,
    pub open_paren: Token<'a>,
    pub arguments: NodeList<'a, &'a Expression<'a>>,
    pub close_paren: Token<'a>,
}

#[derive(Debug)]
pub struct IndexExpression<'a> {
    pub operand: &'a Expression<'a>,
    pub open_bracket: Token<'a>,
    pub index: &'a Expression<'a>,
    pub close_bracket: Token<'a>,
}

#[derive(Debug)]
pub struct InitializerListExpression<'a> {
    pub open_brace: Token<'a>,
    pub items: NodeList<'a, &'a Expression<'a>>,
    pub close_brace: Token<'a>,
}

#[derive(Debug)]
pub struct ReferenceExpression<'a> {
    pub keyword: Token<'a>,
    pub identifier: Token<'a>,
}

#[derive(Debug)]
pub struct InlineFunctionExpression<'a> {
    pub open_brace: Token<'a>,
    pub statements: NodeList<'a, &'a Statement<'a>>,
    pub close_brace: Token<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_empty() {
        let token = Token::missing(SyntaxKind::SemicolonToken, 7);
        assert!(token.is_missing);
        assert!(token.span.is_empty());
        assert_eq!(token.span.start, 7);
    }

    #[test]
    fn test_binary_span_covers_operands() {
        let arena = bumpalo::Bump::new();
        let left = arena.alloc(Expression::Literal(LiteralExpression {
            token: Token::new(SyntaxKind::NumericLiteralToken, TextSpan::new(0, 2), "14"),
        }));
        let right = arena.alloc(Expression::Literal(LiteralExpression {
            token: Token::new(SyntaxKind::NumericLiteralToken, TextSpan::new(5, 2), "12"),
        }));
        let binary = Expression::Binary(BinaryExpression {
            left,
            operator: Token::new(SyntaxKind::PlusToken, TextSpan::new(3, 1), "+"),
            right,
        });
        assert_eq!(binary.kind(), SyntaxKind::BinaryExpression);
        assert_eq!(binary.span(), TextSpan::from_bounds(0, 7));
    }
}
