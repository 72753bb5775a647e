//! Compilation tests: submission chaining, set-once binding, emitters and
//! symbol listing.

use buckle_bound::{Symbol, Value};
use buckle_compiler::Compilation;
use buckle_evaluator::{BufferConsole, Globals};
use buckle_options::CompilerOptions;
use std::sync::Arc;
use std::thread;

fn script(previous: Option<Arc<Compilation>>, text: &str) -> Arc<Compilation> {
    Arc::new(Compilation::create_script(previous, vec![text.to_string()]))
}

fn run(compilation: &Compilation, globals: &mut Globals) -> Option<Value> {
    let result = compilation
        .evaluate_with(globals, &mut BufferConsole::new())
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    result.value
}

// ============================================================================
// Submissions
// ============================================================================

#[test]
fn test_chained_submissions() {
    let mut globals = Globals::new();
    let first = script(None, "int x = 20;");
    assert_eq!(run(&first, &mut globals), None);

    let second = script(Some(first), "int Half(int n) { return n / 2; } Half(x);");
    assert_eq!(run(&second, &mut globals), Some(Value::Int(10)));

    let third = script(Some(second), "x = Half(x) + 1;");
    assert_eq!(run(&third, &mut globals), Some(Value::Int(11)));

    let fourth = script(Some(third), "x;");
    assert_eq!(run(&fourth, &mut globals), Some(Value::Int(11)));
}

#[test]
fn test_redeclaring_in_a_later_submission() {
    let mut globals = Globals::new();
    let first = script(None, "int x = 1; int F() { return 1; }");
    run(&first, &mut globals);
    let second = script(Some(first), "string x = \"shadow\"; int F() { return 2; } F();");
    assert_eq!(run(&second, &mut globals), Some(Value::Int(2)));
    let third = script(Some(second), "x;");
    assert_eq!(run(&third, &mut globals), Some(Value::from("shadow")));
}

#[test]
fn test_program_with_main() {
    let compilation = Compilation::create(vec!["int main() { PrintLine(\"ran\"); return 3; }".to_string()]);
    let mut globals = Globals::new();
    let mut console = BufferConsole::new();
    let result = compilation.evaluate_with(&mut globals, &mut console).unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.value, Some(Value::Int(3)));
    assert_eq!(console.output, "ran\n");
}

#[test]
fn test_multiple_texts() {
    let compilation = Compilation::create_script(
        None,
        vec!["int Twice(int n) { return n * 2; }".to_string(), "Twice(21);".to_string()],
    );
    assert_eq!(run(&compilation, &mut Globals::new()), Some(Value::Int(42)));
}

// ============================================================================
// Diagnostics gate evaluation
// ============================================================================

#[test]
fn test_errors_skip_evaluation() {
    let compilation = script(None, "PrintLine(\"side effect\"); int x = true;");
    let mut console = BufferConsole::new();
    let result = compilation
        .evaluate_with(&mut Globals::new(), &mut console)
        .unwrap();
    assert!(result.diagnostics.has_errors());
    assert_eq!(result.value, None);
    assert_eq!(console.output, "");
}

#[test]
fn test_warnings_as_errors() {
    let text = "1 is null;";
    let plain = script(None, text);
    let result = plain
        .evaluate_with(&mut Globals::new(), &mut BufferConsole::new())
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics.iter().all(|d| d.is_warning()));
    assert_eq!(result.value, Some(Value::Bool(false)));

    let options = CompilerOptions {
        warnings_as_errors: true,
        ..CompilerOptions::default()
    };
    let strict = Compilation::create_script(None, vec![text.to_string()]).with_options(options);
    let result = strict
        .evaluate_with(&mut Globals::new(), &mut BufferConsole::new())
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.value, None);
}

#[test]
fn test_options_carry_to_next_submission() {
    let options = CompilerOptions {
        warnings_as_errors: true,
        ..CompilerOptions::default()
    };
    let first = Arc::new(Compilation::create_script(None, vec![";".to_string()]).with_options(options));
    let second = script(Some(first), ";");
    assert!(second.options().warnings_as_errors);
}

// ============================================================================
// Set-once binding
// ============================================================================

#[test]
fn test_global_scope_is_bound_once() {
    let compilation = script(None, "int x = 1; int F() { return x; }");
    let scopes: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| compilation.global_scope().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for scope in &scopes[1..] {
        assert!(Arc::ptr_eq(&scopes[0], scope));
    }
    assert!(Arc::ptr_eq(&compilation.program().unwrap(), &compilation.program().unwrap()));
}

// ============================================================================
// Emitters and symbols
// ============================================================================

#[test]
fn test_emit_tree() {
    let compilation = Compilation::create(vec!["int Inc(int n) { return n + 1; } Inc(1);".to_string()]);
    let mut output = Vec::new();
    compilation.emit_tree(&mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Inc(int n) {"), "{}", text);
    assert!(text.contains("return n + 1;"), "{}", text);
    assert!(text.contains("<Main>()"), "{}", text);
}

#[test]
fn test_emit_cfg() {
    let compilation = script(None, "int x = 0; while (x < 3) { x = x + 1; } x;");
    let mut output = Vec::new();
    compilation.emit_cfg(&mut output).unwrap();
    let dot = String::from_utf8(output).unwrap();
    assert!(dot.starts_with("digraph G {"));
    assert!(dot.contains("<Start>"));
    assert!(dot.contains("<End>"));
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn test_emit_cfg_without_entry_point() {
    let compilation = Compilation::create(vec!["void F() { }".to_string()]);
    let mut output = Vec::new();
    compilation.emit_cfg(&mut output).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_symbols() {
    let first = script(None, "int x = 1; void F() { }");
    let second = script(Some(first), "string x = \"a\"; int G(int n) { return n; }");
    let symbols = second.symbols().unwrap();
    let names: Vec<_> = symbols.iter().map(Symbol::name).collect();

    assert_eq!(names.iter().filter(|name| **name == "x").count(), 1);
    let x = symbols.iter().find(|symbol| symbol.name() == "x").unwrap();
    assert_eq!(x.type_clause().base(), buckle_bound::TypeSymbol::String);

    let g = names.iter().position(|name| *name == "G").unwrap();
    let f = names.iter().position(|name| *name == "F").unwrap();
    assert!(g < f);
    assert!(names.contains(&"PrintLine"));
    assert_eq!(names.iter().filter(|name| **name == "Value").count(), 5);
}
