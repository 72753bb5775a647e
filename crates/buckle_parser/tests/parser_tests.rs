//! Parser integration tests.
//!
//! Verifies that the parser builds the expected syntax trees from Buckle
//! source and recovers from malformed input without looping.

use bumpalo::Bump;
use buckle_ast::node::*;
use buckle_ast::syntax_kind::SyntaxKind;
use buckle_parser::SyntaxTree;

/// Helper: the messages of all diagnostics produced while parsing `source`.
fn diagnostics_of(source: &str) -> Vec<String> {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, source);
    tree.diagnostics.iter().map(|d| d.message.clone()).collect()
}

/// Helper: the only global statement's expression.
fn single_expression<'a>(tree: &SyntaxTree<'a>) -> &'a Expression<'a> {
    assert_eq!(tree.root.members.len(), 1);
    match tree.root.members[0] {
        Member::GlobalStatement(Statement::Expression(statement)) => statement.expression,
        other => panic!("expected an expression statement, got {:?}", other.kind()),
    }
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn test_parse_empty_source() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "");
    assert!(tree.root.members.is_empty());
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_parse_function_declaration() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "int add(int a, int b) { return a + b; } add(1, 2);");
    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.root.members.len(), 2);
    match tree.root.members[0] {
        Member::Function(function) => {
            assert_eq!(function.identifier.text, "add");
            assert_eq!(function.return_type.type_name.text, "int");
            assert_eq!(function.parameters.len(), 2);
            assert_eq!(function.parameters[1].identifier.text, "b");
            assert_eq!(function.body.statements.len(), 1);
        }
        other => panic!("expected a function, got {:?}", other.kind()),
    }
    assert_eq!(tree.root.members[1].kind(), SyntaxKind::GlobalStatement);
}

#[test]
fn test_local_function_is_a_statement() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "{ void f() { } }");
    match tree.root.members[0] {
        Member::GlobalStatement(Statement::Block(block)) => {
            assert_eq!(block.statements[0].kind(), SyntaxKind::LocalFunctionStatement);
        }
        other => panic!("expected a block, got {:?}", other.kind()),
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_parse_full_type_clause() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "[NotNull] const ref const int[][] x = ref y;");
    assert!(tree.diagnostics.is_empty());
    match tree.root.members[0] {
        Member::GlobalStatement(Statement::VariableDeclaration(declaration)) => {
            let clause = declaration.type_clause;
            assert_eq!(clause.attributes.len(), 1);
            assert_eq!(clause.attributes[0].text, "NotNull");
            assert!(clause.const_ref_keyword.is_some());
            assert!(clause.ref_keyword.is_some());
            assert!(clause.const_keyword.is_some());
            assert_eq!(clause.type_name.text, "int");
            assert_eq!(clause.dimensions(), 2);
            assert_eq!(declaration.initializer.map(|e| e.kind()), Some(SyntaxKind::ReferenceExpression));
        }
        other => panic!("expected a declaration, got {:?}", other.kind()),
    }
}

#[test]
fn test_implicit_declarations() {
    for source in ["auto a = 1;", "var a = 1;", "let a = 1;", "const int a = 1;"] {
        let arena = Bump::new();
        let tree = SyntaxTree::parse(&arena, source);
        assert!(tree.diagnostics.is_empty(), "source: {}", source);
        assert_eq!(
            tree.root.members[0].span().length as usize,
            source.len(),
            "source: {}",
            source
        );
        assert!(matches!(
            tree.root.members[0],
            Member::GlobalStatement(Statement::VariableDeclaration(_))
        ));
    }
}

#[test]
fn test_index_assignment_is_not_a_declaration() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "a[0];");
    assert_eq!(single_expression(&tree).kind(), SyntaxKind::IndexExpression);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_binary_precedence() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "1 + 2 * 3;");
    match single_expression(&tree) {
        Expression::Binary(binary) => {
            assert_eq!(binary.operator.kind, SyntaxKind::PlusToken);
            assert_eq!(binary.left.kind(), SyntaxKind::LiteralExpression);
            match binary.right {
                Expression::Binary(inner) => assert_eq!(inner.operator.kind, SyntaxKind::AsteriskToken),
                other => panic!("expected a binary expression, got {:?}", other.kind()),
            }
        }
        other => panic!("expected a binary expression, got {:?}", other.kind()),
    }
}

#[test]
fn test_unary_binds_tighter_than_power() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "-2 ** 2;");
    match single_expression(&tree) {
        Expression::Binary(binary) => {
            assert_eq!(binary.operator.kind, SyntaxKind::AsteriskAsteriskToken);
            assert_eq!(binary.left.kind(), SyntaxKind::UnaryExpression);
        }
        other => panic!("expected a binary expression, got {:?}", other.kind()),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "a = b += 1;");
    match single_expression(&tree) {
        Expression::Assignment(assignment) => {
            assert_eq!(assignment.identifier.text, "a");
            assert_eq!(assignment.expression.kind(), SyntaxKind::CompoundAssignmentExpression);
        }
        other => panic!("expected an assignment, got {:?}", other.kind()),
    }
}

#[test]
fn test_prefix_increment() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "++x;");
    assert_eq!(single_expression(&tree).kind(), SyntaxKind::PrefixExpression);
}

#[test]
fn test_is_null() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "x isnt null;");
    match single_expression(&tree) {
        Expression::Binary(binary) => assert_eq!(binary.operator.kind, SyntaxKind::IsntKeyword),
        other => panic!("expected a binary expression, got {:?}", other.kind()),
    }
}

#[test]
fn test_inline_function_versus_initializer_list() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "auto a = { return 3; }; auto b = {1, 2};");
    assert!(tree.diagnostics.is_empty());
    let initializers: Vec<SyntaxKind> = tree
        .root
        .members
        .iter()
        .map(|member| match member {
            Member::GlobalStatement(Statement::VariableDeclaration(declaration)) => {
                declaration.initializer.map(|e| e.kind()).unwrap_or(SyntaxKind::BadToken)
            }
            _ => SyntaxKind::BadToken,
        })
        .collect();
    assert_eq!(
        initializers,
        vec![SyntaxKind::InlineFunctionExpression, SyntaxKind::InitializerListExpression]
    );
}

#[test]
fn test_literal_values() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "\"a\\tb\";");
    match single_expression(&tree) {
        Expression::Literal(literal) => assert_eq!(literal.token.value, TokenValue::String("a\tb")),
        other => panic!("expected a literal, got {:?}", other.kind()),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_for_statement_parts() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "for (auto i = 0; i < 10; i += 1) { }");
    assert!(tree.diagnostics.is_empty());
    match tree.root.members[0] {
        Member::GlobalStatement(Statement::For(statement)) => {
            assert_eq!(statement.initializer.kind(), SyntaxKind::VariableDeclarationStatement);
            assert_eq!(statement.condition.kind(), SyntaxKind::BinaryExpression);
            assert_eq!(statement.step.kind(), SyntaxKind::CompoundAssignmentExpression);
        }
        other => panic!("expected a for statement, got {:?}", other.kind()),
    }
}

#[test]
fn test_for_statement_with_empty_parts() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "for (;;) break;");
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_try_catch_finally() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "try { } catch { } finally { }");
    assert!(tree.diagnostics.is_empty());
    match tree.root.members[0] {
        Member::GlobalStatement(Statement::Try(statement)) => {
            assert!(statement.catch_clause.is_some());
            assert!(statement.finally_clause.is_some());
        }
        other => panic!("expected a try statement, got {:?}", other.kind()),
    }
}

#[test]
fn test_do_while_and_if_else() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "do { } while (true); if (a) b = 1; else b = 2;");
    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.root.members.len(), 2);
}

#[test]
fn test_if_else_span_ends_at_else_body() {
    let arena = Bump::new();
    let source = "if (a) b = 1; else b = 2;";
    let tree = SyntaxTree::parse(&arena, source);
    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.root.members[0].span().length as usize, source.len());

    let tree = SyntaxTree::parse(&arena, "if (a) b = 1;");
    assert_eq!(tree.root.members[0].span().length, 13);
}

// ============================================================================
// Error recovery
// ============================================================================

#[test]
fn test_call_arguments_do_not_loop() {
    let diagnostics = diagnostics_of("print(\"Hi\"=);");
    assert_eq!(diagnostics[0], "unexpected token '=', expected ')'");
    assert!(diagnostics.contains(&"unexpected token '=', expected identifier".to_string()));
    assert!(diagnostics.contains(&"unexpected token ')', expected identifier".to_string()));
}

#[test]
fn test_unclosed_block() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "{\n)");
    let messages: Vec<&str> = tree.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages.first().copied(), Some("unexpected token ')', expected identifier"));
    assert_eq!(messages.last().copied(), Some("expected '}' at end of input"));
    assert!(tree.ends_prematurely());
}

#[test]
fn test_missing_semicolon_span() {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, "x = 1");
    let diagnostic = tree.diagnostics.iter().next().cloned().unwrap();
    assert_eq!(diagnostic.message, "expected ';' at end of input");
    assert_eq!(diagnostic.span.map(|s| s.start), Some(5));
}
