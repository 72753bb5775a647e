//! Binder tests: parse source text, bind it, and inspect the bound global
//! scope and its diagnostics.

use buckle_binder::{bind_program, Binder, BoundGlobalScope, BoundProgram, EVAL_NAME, MAIN_NAME};
use buckle_bound::{BoundExpression, BoundStatement, TypeSymbol, Value, VariableKind};
use buckle_diagnostics::DiagnosticSeverity;
use buckle_parser::SyntaxTree;
use bumpalo::Bump;
use std::sync::Arc;

fn bind_with(is_script: bool, previous: Option<Arc<BoundGlobalScope>>, text: &str) -> BoundGlobalScope {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, text);
    Binder::bind_global_scope(is_script, previous, &[tree]).unwrap()
}

fn bind(text: &str) -> BoundGlobalScope {
    bind_with(false, None, text)
}

fn bind_script(text: &str) -> BoundGlobalScope {
    bind_with(true, None, text)
}

fn messages(scope: &BoundGlobalScope) -> Vec<String> {
    scope.diagnostics.iter().map(|d| d.message.clone()).collect()
}

fn program(text: &str) -> BoundProgram {
    bind_program(None, &bind(text)).unwrap()
}

fn declared_initializer(statement: &BoundStatement) -> Arc<BoundExpression> {
    match statement {
        BoundStatement::VariableDeclaration {
            initializer: Some(initializer),
            ..
        } => initializer.clone(),
        other => panic!("expected an initialized declaration, got {:?}", other.kind()),
    }
}

// ============================================================================
// Names and assignments
// ============================================================================

#[test]
fn test_undefined_name() {
    let scope = bind_script("x * 10;");
    assert_eq!(messages(&scope), vec!["undefined symbol 'x'"]);
}

#[test]
fn test_read_only_assignment() {
    let scope = bind_script("let x = 10; x = 0;");
    assert_eq!(messages(&scope), vec!["assignment of read-only variable 'x'"]);
}

#[test]
fn test_assignment_type_mismatch() {
    let scope = bind_script("auto x = 10; x = false;");
    assert_eq!(messages(&scope), vec!["cannot convert from type 'bool' to 'int'"]);
}

#[test]
fn test_explicit_conversion_in_implicit_context() {
    let scope = bind("int x = 1.5;");
    assert_eq!(
        messages(&scope),
        vec!["cannot convert from type 'decimal' to 'int' implicitly; an explicit conversion exists (are you missing a cast?)"]
    );
}

#[test]
fn test_function_used_as_variable() {
    let scope = bind("void f() { } f = 3;");
    assert_eq!(messages(&scope), vec!["function 'f' cannot be used as a variable"]);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let scope = bind("int x = 1; int x = 2;");
    assert_eq!(messages(&scope), vec!["redefinition of 'x'"]);
    assert_eq!(scope.statements.len(), 2);
}

#[test]
fn test_shadowing_in_nested_block() {
    let scope = bind("int x = 1; { int x = 2; x = 3; }");
    assert!(scope.diagnostics.is_empty());
    assert_eq!(scope.variables.len(), 1);
    assert_eq!(scope.variables[0].kind(), VariableKind::Global);
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_implicit_type_is_inferred() {
    let scope = bind("auto d = 1 + 2.5; var s = \"text\";");
    assert!(scope.diagnostics.is_empty());
    let types: Vec<String> = scope.variables.iter().map(|v| v.type_clause().to_string()).collect();
    assert_eq!(types, vec!["decimal", "string"]);
    assert!(scope.variables[0].type_clause().is_nullable());
}

#[test]
fn test_implicit_declaration_errors() {
    assert_eq!(
        messages(&bind("auto a = null;")),
        vec!["cannot initialize an implicitly-typed variable with 'null'"]
    );
    assert_eq!(
        messages(&bind("auto a;")),
        vec!["implicitly-typed variable must have an initializer"]
    );
    assert_eq!(
        messages(&bind("auto a = {};")),
        vec!["cannot initialize an implicitly-typed variable with an empty initializer list"]
    );
}

#[test]
fn test_unknown_type_and_attribute() {
    assert_eq!(messages(&bind("foo x = 3;")), vec!["unknown type 'foo'"]);
    assert_eq!(messages(&bind("[Maybe]int x = 3;")), vec!["unknown attribute 'Maybe'"]);
}

#[test]
fn test_null_into_not_null() {
    let scope = bind("[NotNull]int a = null;");
    assert_eq!(messages(&scope), vec!["cannot assign 'null' to a non-nullable variable"]);
}

#[test]
fn test_void_variable() {
    assert_eq!(messages(&bind("void v;")), vec!["cannot use void as a type"]);
}

#[test]
fn test_reference_initializers() {
    assert!(bind("int a = 1; ref int b = ref a;").diagnostics.is_empty());
    assert_eq!(
        messages(&bind("int a = 1; ref int b = a;")),
        vec!["a by-reference variable must be initialized with a reference"]
    );
    assert_eq!(
        messages(&bind("int a = 1; int b = ref a;")),
        vec!["cannot initialize a by-value variable with a reference"]
    );
}

#[test]
fn test_constant_variable_folds() {
    let scope = bind("let x = 10; int y = x * 2;");
    assert!(scope.diagnostics.is_empty());
    let initializer = declared_initializer(&scope.statements[1]);
    assert_eq!(initializer.constant().map(|c| c.value), Some(Value::Int(20)));
}

#[test]
fn test_initializer_list_and_index() {
    let scope = bind("int[] a = {1, 2, 3}; int b = a[1];");
    assert!(scope.diagnostics.is_empty());
    assert_eq!(scope.variables[0].type_clause().to_string(), "int[]");

    let scope = bind("int a = 1; int b = a[0];");
    assert_eq!(messages(&scope), vec!["cannot apply indexing with [] to an expression of type 'int'"]);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_invalid_binary_operator() {
    let scope = bind("int a = 1 + true;");
    assert_eq!(messages(&scope), vec!["operator '+' is not defined for types 'int' and 'bool'"]);
}

#[test]
fn test_invalid_unary_operator() {
    let scope = bind("bool a = -true;");
    assert_eq!(messages(&scope), vec!["operator '-' is not defined for type 'bool'"]);
}

#[test]
fn test_error_operands_do_not_cascade() {
    let scope = bind("int a = (x + 1) * 2;");
    assert_eq!(messages(&scope), vec!["undefined symbol 'x'"]);
}

#[test]
fn test_is_requires_null() {
    let scope = bind("int a = 1; bool b = a is 3;");
    assert_eq!(
        messages(&scope),
        vec!["unsupported: cannot use 'is' or 'isnt' operators with non-null types"]
    );
    assert!(scope.diagnostics.has_fatal());
}

#[test]
fn test_is_on_literal_always_has_value() {
    let scope = bind("bool b = 3 is null;");
    assert_eq!(messages(&scope), vec!["expression will always result in 'false'"]);
    assert!(!scope.diagnostics.has_errors());
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_type_name_call_is_cast() {
    let scope = bind("auto d = decimal(3);");
    assert!(scope.diagnostics.is_empty());
    let initializer = declared_initializer(&scope.statements[0]);
    assert!(matches!(initializer.as_ref(), BoundExpression::Cast { .. }));
    assert_eq!(initializer.constant().map(|c| c.value), Some(Value::Decimal(3.0)));
}

#[test]
fn test_overload_resolution() {
    let scope = bind("void f(int a) { } void f(string a) { } f(\"x\");");
    assert!(scope.diagnostics.is_empty());
    let BoundStatement::Expression { expression } = scope.statements[0].as_ref() else {
        panic!("expected an expression statement");
    };
    let BoundExpression::Call { function, .. } = expression.as_ref() else {
        panic!("expected a call");
    };
    assert_eq!(function.parameters()[0].type_clause().base(), TypeSymbol::String);
}

#[test]
fn test_call_diagnostics() {
    assert_eq!(
        messages(&bind("void f(int a) { } f();")),
        vec!["function 'f' expects 1 arguments, got 0"]
    );
    assert_eq!(
        messages(&bind("void f(int a) { } f(1.5);")),
        vec!["argument 1: cannot implicitly pass type 'decimal' into parameter of type 'int'"]
    );
    assert_eq!(messages(&bind("g();")), vec!["undefined function 'g'"]);
    assert_eq!(
        messages(&bind("int a = 1; a();")),
        vec!["called object 'a' is not a function"]
    );
}

#[test]
fn test_function_declared_after_use() {
    let scope = bind("int y = f(); int f() { return 3; }");
    assert!(scope.diagnostics.is_empty());
    assert_eq!(scope.function_bodies.len(), 1);
}

#[test]
fn test_duplicate_function_and_parameter() {
    let scope = bind("void f(int a, int a) { } void f(int a) { }");
    assert_eq!(
        messages(&scope),
        vec!["redefinition of parameter 'a'", "redefinition of function 'f'"]
    );
}

#[test]
fn test_builtin_signature_is_reserved() {
    let scope = bind("void PrintLine(any text) { }");
    assert_eq!(messages(&scope), vec!["redefinition of function 'PrintLine'"]);

    let scope = bind("void PrintLine(int line, string text) { }");
    assert!(scope.diagnostics.is_empty());
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_break_outside_loop() {
    let scope = bind("break;");
    assert_eq!(messages(&scope), vec!["break statements can only be used within a loop"]);
}

#[test]
fn test_loop_labels() {
    let scope = bind("while (true) { continue; }");
    assert!(scope.diagnostics.is_empty());
    let BoundStatement::While {
        body,
        break_label,
        continue_label,
        ..
    } = scope.statements[0].as_ref()
    else {
        panic!("expected a while statement");
    };
    assert_eq!(break_label.name(), "Break1");
    let BoundStatement::Block(block) = body.as_ref() else {
        panic!("expected a block body");
    };
    assert!(matches!(block.statements[0].as_ref(), BoundStatement::Goto(label) if label == continue_label));
}

#[test]
fn test_condition_must_convert_to_bool() {
    let scope = bind("if (\"yes\") { }");
    assert_eq!(
        messages(&scope),
        vec!["cannot convert from type 'string' to 'bool' implicitly; an explicit conversion exists (are you missing a cast?)"]
    );
}

#[test]
fn test_invalid_expression_statement() {
    let scope = bind("int a = 1; a + 1;");
    assert_eq!(
        messages(&scope),
        vec!["only assignment and call expressions can be used as a statement"]
    );
    assert!(bind_script("int a = 1; a + 1;").diagnostics.is_empty());
}

#[test]
fn test_return_diagnostics() {
    assert_eq!(
        messages(&bind("void f() { return 3; }")),
        vec!["cannot return a value in a function returning void"]
    );
    assert_eq!(
        messages(&bind("int f() { return; }")),
        vec!["cannot return without a value in a function returning non-void"]
    );
    assert_eq!(
        messages(&bind("return 3;")),
        vec!["unsupported: global return cannot return a value"]
    );
    assert!(bind_script("return 3;").diagnostics.is_empty());
}

#[test]
fn test_try_requires_catch_or_finally() {
    let scope = bind("try { }");
    assert_eq!(messages(&scope), vec!["try statement must have a catch or finally"]);
    assert!(bind("try { } catch { }").diagnostics.is_empty());
}

#[test]
fn test_local_function_is_unsupported() {
    let scope = bind("void f() { void g() { } }");
    assert_eq!(messages(&scope), vec!["unsupported: local functions are not supported"]);
}

#[test]
fn test_inline_function() {
    let scope = bind("auto x = { int a = 3; return a * 2; };");
    assert!(scope.diagnostics.is_empty());
    assert_eq!(scope.variables[0].type_clause().to_string(), "int");

    let scope = bind("auto x = { int a = 3; };");
    assert_eq!(messages(&scope), vec!["missing return statement in inline function"]);

    let scope = bind("auto x = { if (true) { return 1; } return \"s\"; };");
    assert_eq!(messages(&scope), vec!["not all code paths return the same type"]);
}

// ============================================================================
// Entry points and programs
// ============================================================================

#[test]
fn test_entry_points() {
    let scope = bind("int x = 3;");
    assert_eq!(scope.main_function.as_ref().map(|f| f.name()), Some(MAIN_NAME));

    let scope = bind_script("int x = 3;");
    assert_eq!(scope.script_function.as_ref().map(|f| f.name()), Some(EVAL_NAME));
    assert!(scope.main_function.is_none());

    let scope = bind("void main() { }");
    assert_eq!(scope.main_function.as_ref().map(|f| f.name()), Some("main"));
}

#[test]
fn test_main_diagnostics() {
    assert_eq!(
        messages(&bind("int main(int a) { return a; }")),
        vec!["invalid main signature: must return void or int and take no arguments"]
    );
    assert_eq!(
        messages(&bind("void main() { } int x = 3;")),
        vec!["declaring a main function and using global statements creates an ambiguous entry point"]
    );
}

#[test]
fn test_not_all_paths_return() {
    let program = program("int f(int a) { if (a > 0) { return 1; } }");
    let messages: Vec<_> = program.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["not all code paths return a value"]);

    let program = self::program("int f(int a) { if (a > 0) { return 1; } else { return 2; } }");
    assert!(program.diagnostics.is_empty());
}

#[test]
fn test_program_bodies_are_lowered() {
    let program = program("int x = 0; while (x < 3) { x = x + 1; }");
    let main = program.entry_point().unwrap();
    let body = program.function_body(main).unwrap();
    assert!(body
        .statements
        .iter()
        .all(|s| !matches!(s.as_ref(), BoundStatement::While { .. } | BoundStatement::Block(_))));
    assert!(matches!(body.statements.last().map(|s| s.as_ref()), Some(BoundStatement::Return { expression: None })));
}

#[test]
fn test_previous_submissions_are_visible() {
    let first = Arc::new(bind_with(true, None, "int x = 3; int twice(int a) { return a * 2; }"));
    let second = bind_with(true, Some(first.clone()), "x = twice(x);");
    assert!(second.diagnostics.is_empty());
    assert!(second.variables.is_empty());

    let third = bind_with(true, Some(Arc::new(second)), "string x = \"shadow\"; x;");
    assert!(third.diagnostics.is_empty());
    assert_eq!(third.variables[0].type_clause().base(), TypeSymbol::String);
}

#[test]
fn test_syntax_diagnostics_come_first() {
    let scope = bind_script("int a = ; b;");
    let first = scope.diagnostics.iter().next().unwrap();
    assert_ne!(first.message, "undefined symbol 'b'");
    assert!(scope
        .diagnostics
        .iter()
        .all(|d| d.severity != DiagnosticSeverity::Warning));
}
