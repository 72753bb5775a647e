//! The Buckle parser implementation.
//!
//! A recursive descent parser over the on-demand scanner. Every node is
//! allocated in the caller's arena.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use buckle_ast::node::*;
use buckle_ast::syntax_kind::SyntaxKind;
use buckle_core::text::TextSpan;
use buckle_diagnostics::{messages, DiagnosticQueue};
use buckle_scanner::{LiteralValue, Scanner};

use crate::precedence::{get_binary_operator_precedence, get_unary_operator_precedence, OperatorPrecedence};

/// A parsed compilation unit and the diagnostics produced while scanning
/// and parsing it.
pub struct SyntaxTree<'a> {
    pub root: &'a CompilationUnit<'a>,
    pub diagnostics: DiagnosticQueue,
}

impl<'a> SyntaxTree<'a> {
    pub fn parse(arena: &'a Bump, text: &str) -> Self {
        Parser::new(arena, text).parse()
    }

    /// Whether the input ended while a construct was still open, e.g. an
    /// unclosed block. The REPL keeps reading lines while this holds.
    pub fn ends_prematurely(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.code == messages::EXPECTED_TOKEN.code)
    }
}

/// What the tokens at the current position declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclarationShape {
    None,
    Variable,
    Function,
}

pub struct Parser<'a> {
    arena: &'a Bump,
    scanner: Scanner,
    current: Token<'a>,
    diagnostics: DiagnosticQueue,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Bump, text: &str) -> Self {
        let mut parser = Self {
            arena,
            scanner: Scanner::new(text),
            current: Token::missing(SyntaxKind::EndOfFileToken, 0),
            diagnostics: DiagnosticQueue::new(),
        };
        parser.next_token();
        parser
    }

    pub fn parse(mut self) -> SyntaxTree<'a> {
        let root = self.parse_compilation_unit();
        let mut diagnostics = self.scanner.take_diagnostics();
        diagnostics.move_from(&mut self.diagnostics);
        diagnostics.sort();
        SyntaxTree { root, diagnostics }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    /// Advance and return the token that was current before the call.
    fn next_token(&mut self) -> Token<'a> {
        let previous = self.current;
        self.scanner.scan();
        self.current = self.read_token();
        previous
    }

    fn read_token(&self) -> Token<'a> {
        let text = self.arena.alloc_str(&self.scanner.token_text());
        let value = match self.scanner.token_value() {
            LiteralValue::None => TokenValue::None,
            LiteralValue::Int(value) => TokenValue::Int(*value),
            LiteralValue::Decimal(value) => TokenValue::Decimal(*value),
            LiteralValue::String(value) => TokenValue::String(self.arena.alloc_str(value)),
        };
        Token {
            kind: self.scanner.token(),
            span: self.scanner.token_span(),
            text,
            value,
            is_missing: false,
        }
    }

    #[inline]
    fn current_kind(&self) -> SyntaxKind {
        self.current.kind
    }

    /// Kind of the token after the current one.
    fn peek_kind(&mut self) -> SyntaxKind {
        self.scanner.look_ahead(|s| s.scan())
    }

    fn expect_token(&mut self, kind: SyntaxKind) -> Token<'a> {
        if self.current_kind() == kind {
            return self.next_token();
        }
        self.report_expected(&kind.display_name());
        Token::missing(kind, self.current.span.start)
    }

    fn optional_token(&mut self, kind: SyntaxKind) -> Option<Token<'a>> {
        if self.current_kind() == kind {
            Some(self.next_token())
        } else {
            None
        }
    }

    fn report_expected(&mut self, expected: &str) {
        if self.current_kind() == SyntaxKind::EndOfFileToken {
            self.diagnostics
                .report(self.current.span, &messages::EXPECTED_TOKEN, &[expected]);
        } else {
            let text = self.current.text;
            self.diagnostics
                .report(self.current.span, &messages::UNEXPECTED_TOKEN, &[text, expected]);
        }
    }

    fn at_end_of(&self, close: SyntaxKind) -> bool {
        let kind = self.current_kind();
        kind == close || kind == SyntaxKind::EndOfFileToken
    }

    /// Skip the current token if parsing a list element consumed nothing.
    fn ensure_progress(&mut self, start: TextSpan, start_kind: SyntaxKind) {
        if self.current.span == start && self.current_kind() == start_kind {
            self.next_token();
        }
    }

    fn peek_declaration(&mut self) -> DeclarationShape {
        self.scanner.look_ahead(|s| {
            let mut kind = s.token();
            while kind == SyntaxKind::OpenBracketToken {
                if s.scan() != SyntaxKind::IdentifierToken || s.scan() != SyntaxKind::CloseBracketToken {
                    return DeclarationShape::None;
                }
                kind = s.scan();
            }
            if kind == SyntaxKind::ConstKeyword {
                return DeclarationShape::Variable;
            }
            if kind == SyntaxKind::RefKeyword {
                kind = s.scan();
                if kind == SyntaxKind::ConstKeyword {
                    kind = s.scan();
                }
            }
            match kind {
                SyntaxKind::AutoKeyword | SyntaxKind::VarKeyword | SyntaxKind::LetKeyword => {
                    return DeclarationShape::Variable;
                }
                SyntaxKind::IdentifierToken => {}
                _ => return DeclarationShape::None,
            }
            kind = s.scan();
            while kind == SyntaxKind::OpenBracketToken {
                if s.scan() != SyntaxKind::CloseBracketToken {
                    return DeclarationShape::None;
                }
                kind = s.scan();
            }
            if kind != SyntaxKind::IdentifierToken {
                return DeclarationShape::None;
            }
            if s.scan() == SyntaxKind::OpenParenToken {
                DeclarationShape::Function
            } else {
                DeclarationShape::Variable
            }
        })
    }

    /// Whether the `{` at the current position opens an inline function
    /// rather than an initializer list: a `;` appears before the matching `}`.
    fn is_inline_function_ahead(&mut self) -> bool {
        self.scanner.look_ahead(|s| {
            let mut depth = 0usize;
            loop {
                match s.scan() {
                    SyntaxKind::EndOfFileToken => return false,
                    SyntaxKind::SemicolonToken => return true,
                    SyntaxKind::OpenBraceToken => depth += 1,
                    SyntaxKind::CloseBraceToken => {
                        if depth == 0 {
                            return false;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
        })
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn parse_compilation_unit(&mut self) -> &'a CompilationUnit<'a> {
        let mut members = BumpVec::new_in(self.arena);
        while self.current_kind() != SyntaxKind::EndOfFileToken {
            let (start, start_kind) = (self.current.span, self.current_kind());
            members.push(self.parse_member());
            self.ensure_progress(start, start_kind);
        }
        let end_of_file_token = self.expect_token(SyntaxKind::EndOfFileToken);
        self.arena.alloc(CompilationUnit {
            members: members.into_bump_slice(),
            end_of_file_token,
        })
    }

    fn parse_member(&mut self) -> Member<'a> {
        if self.peek_declaration() == DeclarationShape::Function {
            Member::Function(self.parse_function_declaration())
        } else {
            Member::GlobalStatement(self.parse_statement())
        }
    }

    fn parse_function_declaration(&mut self) -> &'a FunctionDeclaration<'a> {
        let return_type = self.parse_type_clause();
        let identifier = self.expect_token(SyntaxKind::IdentifierToken);
        let open_paren = self.expect_token(SyntaxKind::OpenParenToken);
        let parameters = self.parse_parameter_list();
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        let body = self.parse_block();
        self.arena.alloc(FunctionDeclaration {
            return_type,
            identifier,
            open_paren,
            parameters,
            close_paren,
            body,
        })
    }

    fn parse_parameter_list(&mut self) -> NodeList<'a, Parameter<'a>> {
        let mut parameters = BumpVec::new_in(self.arena);
        while !self.at_end_of(SyntaxKind::CloseParenToken) {
            let type_clause = self.parse_type_clause();
            let identifier = self.expect_token(SyntaxKind::IdentifierToken);
            parameters.push(Parameter { type_clause, identifier });
            if self.optional_token(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        parameters.into_bump_slice()
    }

    fn parse_type_clause(&mut self) -> &'a TypeClauseSyntax<'a> {
        let start = self.current.span.start;

        let mut attributes = BumpVec::new_in(self.arena);
        while self.current_kind() == SyntaxKind::OpenBracketToken {
            self.next_token();
            attributes.push(self.expect_token(SyntaxKind::IdentifierToken));
            self.expect_token(SyntaxKind::CloseBracketToken);
        }

        let mut const_keyword = self.optional_token(SyntaxKind::ConstKeyword);
        let ref_keyword = self.optional_token(SyntaxKind::RefKeyword);
        let mut const_ref_keyword = None;
        if ref_keyword.is_some() {
            const_ref_keyword = const_keyword.take();
            const_keyword = self.optional_token(SyntaxKind::ConstKeyword);
        }

        let type_name = match self.current_kind() {
            SyntaxKind::IdentifierToken
            | SyntaxKind::AutoKeyword
            | SyntaxKind::VarKeyword
            | SyntaxKind::LetKeyword => self.next_token(),
            _ => self.expect_token(SyntaxKind::IdentifierToken),
        };

        let mut brackets = BumpVec::new_in(self.arena);
        while self.current_kind() == SyntaxKind::OpenBracketToken
            && self.peek_kind() == SyntaxKind::CloseBracketToken
        {
            let open = self.next_token();
            let close = self.next_token();
            brackets.push((open, close));
        }

        self.arena.alloc(TypeClauseSyntax {
            attributes: attributes.into_bump_slice(),
            const_ref_keyword,
            ref_keyword,
            const_keyword,
            type_name,
            brackets: brackets.into_bump_slice(),
            start,
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> &'a Statement<'a> {
        let statement = match self.current_kind() {
            SyntaxKind::OpenBraceToken => Statement::Block(self.parse_block_statement()),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_while_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::BreakKeyword => Statement::Break(self.parse_keyword_statement()),
            SyntaxKind::ContinueKeyword => Statement::Continue(self.parse_keyword_statement()),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::SemicolonToken => Statement::Empty(self.next_token()),
            _ => match self.peek_declaration() {
                DeclarationShape::Function => Statement::LocalFunction(self.parse_function_declaration()),
                DeclarationShape::Variable => self.parse_variable_declaration(),
                DeclarationShape::None => self.parse_expression_statement(),
            },
        };
        self.arena.alloc(statement)
    }

    fn parse_block(&mut self) -> &'a BlockStatement<'a> {
        let block = self.parse_block_statement();
        self.arena.alloc(block)
    }

    fn parse_block_statement(&mut self) -> BlockStatement<'a> {
        let open_brace = self.expect_token(SyntaxKind::OpenBraceToken);
        let statements = self.parse_statement_list();
        let close_brace = self.expect_token(SyntaxKind::CloseBraceToken);
        BlockStatement {
            open_brace,
            statements,
            close_brace,
        }
    }

    fn parse_statement_list(&mut self) -> NodeList<'a, &'a Statement<'a>> {
        let mut statements = BumpVec::new_in(self.arena);
        while !self.at_end_of(SyntaxKind::CloseBraceToken) {
            let (start, start_kind) = (self.current.span, self.current_kind());
            statements.push(self.parse_statement());
            self.ensure_progress(start, start_kind);
        }
        statements.into_bump_slice()
    }

    fn parse_variable_declaration(&mut self) -> Statement<'a> {
        let type_clause = self.parse_type_clause();
        let identifier = self.expect_token(SyntaxKind::IdentifierToken);
        let equals = self.optional_token(SyntaxKind::EqualsToken);
        let initializer = match equals {
            Some(_) => Some(self.parse_expression()),
            None => None,
        };
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        Statement::VariableDeclaration(VariableDeclarationStatement {
            type_clause,
            identifier,
            equals,
            initializer,
            semicolon,
        })
    }

    fn parse_if_statement(&mut self) -> Statement<'a> {
        let keyword = self.next_token();
        let open_paren = self.expect_token(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        let then = self.parse_statement();
        let else_clause = match self.optional_token(SyntaxKind::ElseKeyword) {
            Some(keyword) => Some(ElseClause {
                keyword,
                body: self.parse_statement(),
            }),
            None => None,
        };
        Statement::If(IfStatement {
            keyword,
            open_paren,
            condition,
            close_paren,
            then,
            else_clause,
        })
    }

    fn parse_while_statement(&mut self) -> Statement<'a> {
        let keyword = self.next_token();
        let open_paren = self.expect_token(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();
        Statement::While(WhileStatement {
            keyword,
            open_paren,
            condition,
            close_paren,
            body,
        })
    }

    fn parse_do_while_statement(&mut self) -> Statement<'a> {
        let do_keyword = self.next_token();
        let body = self.parse_statement();
        let while_keyword = self.expect_token(SyntaxKind::WhileKeyword);
        let open_paren = self.expect_token(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        Statement::DoWhile(DoWhileStatement {
            do_keyword,
            body,
            while_keyword,
            open_paren,
            condition,
            close_paren,
            semicolon,
        })
    }

    fn parse_for_statement(&mut self) -> Statement<'a> {
        let keyword = self.next_token();
        let open_paren = self.expect_token(SyntaxKind::OpenParenToken);

        let initializer = if self.current_kind() == SyntaxKind::SemicolonToken {
            Statement::Empty(self.next_token())
        } else if self.peek_declaration() == DeclarationShape::Variable {
            self.parse_variable_declaration()
        } else {
            self.parse_expression_statement()
        };
        let initializer: &'a Statement<'a> = self.arena.alloc(initializer);

        let condition = if self.current_kind() == SyntaxKind::SemicolonToken {
            self.empty_expression()
        } else {
            self.parse_expression()
        };
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        let step = if self.current_kind() == SyntaxKind::CloseParenToken {
            self.empty_expression()
        } else {
            self.parse_expression()
        };
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();

        Statement::For(ForStatement {
            keyword,
            open_paren,
            initializer,
            condition,
            semicolon,
            step,
            close_paren,
            body,
        })
    }

    fn parse_keyword_statement(&mut self) -> KeywordStatement<'a> {
        let keyword = self.next_token();
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        KeywordStatement { keyword, semicolon }
    }

    fn parse_return_statement(&mut self) -> Statement<'a> {
        let keyword = self.next_token();
        let expression = match self.current_kind() {
            SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => None,
            _ => Some(self.parse_expression()),
        };
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        Statement::Return(ReturnStatement {
            keyword,
            expression,
            semicolon,
        })
    }

    fn parse_try_statement(&mut self) -> Statement<'a> {
        let keyword = self.next_token();
        let body = self.parse_block();
        let catch_clause = match self.optional_token(SyntaxKind::CatchKeyword) {
            Some(keyword) => Some(CatchClause {
                keyword,
                body: self.parse_block(),
            }),
            None => None,
        };
        let finally_clause = match self.optional_token(SyntaxKind::FinallyKeyword) {
            Some(keyword) => Some(FinallyClause {
                keyword,
                body: self.parse_block(),
            }),
            None => None,
        };
        Statement::Try(TryStatement {
            keyword,
            body,
            catch_clause,
            finally_clause,
        })
    }

    fn parse_expression_statement(&mut self) -> Statement<'a> {
        let expression = self.parse_expression();
        let semicolon = self.expect_token(SyntaxKind::SemicolonToken);
        Statement::Expression(ExpressionStatement { expression, semicolon })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn empty_expression(&mut self) -> &'a Expression<'a> {
        let span = TextSpan::empty(self.current.span.start);
        self.arena.alloc(Expression::Empty(span))
    }

    pub fn parse_expression(&mut self) -> &'a Expression<'a> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> &'a Expression<'a> {
        if self.current_kind() == SyntaxKind::IdentifierToken {
            let next = self.peek_kind();
            if next == SyntaxKind::EqualsToken {
                let identifier = self.next_token();
                let equals = self.next_token();
                let expression = self.parse_assignment_expression();
                return self.arena.alloc(Expression::Assignment(AssignmentExpression {
                    identifier,
                    equals,
                    expression,
                }));
            }
            if next.is_compound_assignment() {
                let identifier = self.next_token();
                let operator = self.next_token();
                let expression = self.parse_assignment_expression();
                return self.arena.alloc(Expression::CompoundAssignment(CompoundAssignmentExpression {
                    identifier,
                    operator,
                    expression,
                }));
            }
        }
        self.parse_binary_expression(OperatorPrecedence::Lowest)
    }

    fn parse_binary_expression(&mut self, parent_precedence: OperatorPrecedence) -> &'a Expression<'a> {
        let unary_precedence = get_unary_operator_precedence(self.current_kind());
        let mut left = if unary_precedence != OperatorPrecedence::Invalid && unary_precedence >= parent_precedence {
            self.parse_unary_expression(unary_precedence)
        } else {
            self.parse_postfix_expression()
        };

        loop {
            let precedence = get_binary_operator_precedence(self.current_kind());
            if precedence == OperatorPrecedence::Invalid || precedence <= parent_precedence {
                break;
            }
            let operator = self.next_token();
            let right = self.parse_binary_expression(precedence);
            left = self.arena.alloc(Expression::Binary(BinaryExpression { left, operator, right }));
        }

        left
    }

    fn parse_unary_expression(&mut self, precedence: OperatorPrecedence) -> &'a Expression<'a> {
        let operator = self.next_token();
        if matches!(operator.kind, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken) {
            let identifier = self.expect_token(SyntaxKind::IdentifierToken);
            return self.arena.alloc(Expression::Prefix(PrefixExpression { operator, identifier }));
        }
        let operand = self.parse_binary_expression(precedence);
        self.arena.alloc(Expression::Unary(UnaryExpression { operator, operand }))
    }

    fn parse_postfix_expression(&mut self) -> &'a Expression<'a> {
        let mut expression = self.parse_primary_expression();
        while self.current_kind() == SyntaxKind::OpenBracketToken {
            let open_bracket = self.next_token();
            let index = self.parse_expression();
            let close_bracket = self.expect_token(SyntaxKind::CloseBracketToken);
            expression = self.arena.alloc(Expression::Index(IndexExpression {
                operand: expression,
                open_bracket,
                index,
                close_bracket,
            }));
        }
        expression
    }

    fn parse_primary_expression(&mut self) -> &'a Expression<'a> {
        let expression = match self.current_kind() {
            SyntaxKind::OpenParenToken => {
                let open_paren = self.next_token();
                let expression = self.parse_expression();
                let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
                Expression::Parenthesized(ParenthesizedExpression {
                    open_paren,
                    expression,
                    close_paren,
                })
            }
            SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NullKeyword
            | SyntaxKind::NumericLiteralToken
            | SyntaxKind::StringLiteralToken => Expression::Literal(LiteralExpression {
                token: self.next_token(),
            }),
            SyntaxKind::OpenBraceToken => {
                if self.is_inline_function_ahead() {
                    self.parse_inline_function()
                } else {
                    self.parse_initializer_list()
                }
            }
            SyntaxKind::RefKeyword => {
                let keyword = self.next_token();
                let identifier = self.expect_token(SyntaxKind::IdentifierToken);
                Expression::Reference(ReferenceExpression { keyword, identifier })
            }
            SyntaxKind::IdentifierToken if self.peek_kind() == SyntaxKind::OpenParenToken => self.parse_call(),
            _ => Expression::Name(NameExpression {
                identifier: self.expect_token(SyntaxKind::IdentifierToken),
            }),
        };
        self.arena.alloc(expression)
    }

    fn parse_call(&mut self) -> Expression<'a> {
        let identifier = self.next_token();
        let open_paren = self.next_token();
        let arguments = self.parse_expression_list(SyntaxKind::CloseParenToken);
        let close_paren = self.expect_token(SyntaxKind::CloseParenToken);
        Expression::Call(CallExpression {
            identifier,
            open_paren,
            arguments,
            close_paren,
        })
    }

    fn parse_initializer_list(&mut self) -> Expression<'a> {
        let open_brace = self.next_token();
        let items = self.parse_expression_list(SyntaxKind::CloseBraceToken);
        let close_brace = self.expect_token(SyntaxKind::CloseBraceToken);
        Expression::InitializerList(InitializerListExpression {
            open_brace,
            items,
            close_brace,
        })
    }

    fn parse_inline_function(&mut self) -> Expression<'a> {
        let open_brace = self.next_token();
        let statements = self.parse_statement_list();
        let close_brace = self.expect_token(SyntaxKind::CloseBraceToken);
        Expression::InlineFunction(InlineFunctionExpression {
            open_brace,
            statements,
            close_brace,
        })
    }

    /// Comma separated expressions up to, not including, `close`.
    fn parse_expression_list(&mut self, close: SyntaxKind) -> NodeList<'a, &'a Expression<'a>> {
        let mut items = BumpVec::new_in(self.arena);
        while !self.at_end_of(close) {
            items.push(self.parse_expression());
            if self.optional_token(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        items.into_bump_slice()
    }
}
