//! Evaluator tests: parse, bind, lower and run small programs against an
//! in-memory console.

use buckle_binder::{bind_program, Binder, BoundProgram};
use buckle_bound::Value;
use buckle_diagnostics::InternalError;
use buckle_evaluator::{BufferConsole, EvaluationError, Evaluator, Globals, RuntimeFault, MAX_CALL_DEPTH};
use buckle_parser::SyntaxTree;
use bumpalo::Bump;
use std::sync::Arc;

fn compile(is_script: bool, text: &str) -> BoundProgram {
    let arena = Bump::new();
    let tree = SyntaxTree::parse(&arena, text);
    let global_scope = Binder::bind_global_scope(is_script, None, &[tree]).unwrap();
    assert!(
        global_scope.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        global_scope.diagnostics.iter().map(|d| d.message.clone()).collect::<Vec<_>>()
    );
    bind_program(None, &global_scope).unwrap()
}

fn run_with(text: &str, console: &mut BufferConsole) -> Result<Option<Value>, EvaluationError> {
    let program = compile(true, text);
    let mut globals = Globals::new();
    Evaluator::new(&program, &mut globals, console).evaluate()
}

fn run(text: &str) -> Result<Option<Value>, EvaluationError> {
    run_with(text, &mut BufferConsole::new())
}

fn output(text: &str) -> String {
    let mut console = BufferConsole::new();
    run_with(text, &mut console).unwrap();
    console.output
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(run("14 + 12;").unwrap(), Some(Value::Int(26)));
    assert_eq!(run("int a = 7; a / 2;").unwrap(), Some(Value::Int(3)));
    assert_eq!(run("decimal d = 1.5; d * 2;").unwrap(), Some(Value::Decimal(3.0)));
}

#[test]
fn test_short_circuit() {
    let text = "bool Side() { PrintLine(\"side\"); return true; } bool a = false; a && Side();";
    let mut console = BufferConsole::new();
    assert_eq!(run_with(text, &mut console).unwrap(), Some(Value::Bool(false)));
    assert_eq!(console.output, "");
}

#[test]
fn test_null_propagation() {
    assert_eq!(run("int x = null; x + 1;").unwrap(), None);
    assert_eq!(run("int x = null; x is null;").unwrap(), Some(Value::Bool(true)));
    assert_eq!(run("int x = 3; HasValue(x);").unwrap(), Some(Value::Bool(true)));
}

#[test]
fn test_string_cast() {
    assert_eq!(run("string s = \"41\"; int(s) + 1;").unwrap(), Some(Value::Int(42)));
}

#[test]
fn test_arrays() {
    assert_eq!(run("int[] a = {1, 2, 3}; a[1];").unwrap(), Some(Value::Int(2)));
    assert_eq!(
        run("int[] a = {1, 2}; int i = 5; a[i];"),
        Err(EvaluationError::Fault(RuntimeFault::IndexOutOfRange { index: 5, length: 2 }))
    );
    assert_eq!(
        run("int[] a = null; a[0];"),
        Err(EvaluationError::Fault(RuntimeFault::NullArray))
    );
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_if_else() {
    let text = "int x = 5; int y; if (x > 3) { y = 10; } else { y = 20; } y;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(10)));
}

#[test]
fn test_loops() {
    let text = "int sum = 0; for (int i = 1; i <= 10; ++i) { sum += i; } sum;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(55)));

    let text = "int i = 0; while (true) { ++i; if (i == 4) break; } i;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(4)));

    let text = "int i = 0; int n = 0; do { ++i; if (i > 5) continue; ++n; } while (i < 7); n;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(5)));
}

#[test]
fn test_declaration_resets_result() {
    assert_eq!(run("1 + 1; int x = 4;").unwrap(), None);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursion() {
    let text = "int Fib(int n) { if (n < 2) return n; return Fib(n - 1) + Fib(n - 2); } Fib(10);";
    assert_eq!(run(text).unwrap(), Some(Value::Int(55)));
}

#[test]
fn test_locals_are_per_call() {
    let text = "int Count(int n) { int local = n; if (n > 0) Count(n - 1); return local; } Count(3);";
    assert_eq!(run(text).unwrap(), Some(Value::Int(3)));
}

#[test]
fn test_reference_variables() {
    assert_eq!(run("int a = 1; ref int b = ref a; b = 5; a;").unwrap(), Some(Value::Int(5)));
    let text = "void Bump(ref int x) { x += 1; } int a = 1; Bump(ref a); Bump(ref a); a;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(3)));
}

#[test]
fn test_inline_function() {
    let text = "int x = { int y = 4; return y * 2; }; x;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(8)));
}

#[test]
fn test_main_function() {
    let program = compile(false, "void main() { PrintLine(\"hi\"); }");
    let mut globals = Globals::new();
    let mut console = BufferConsole::new();
    let result = Evaluator::new(&program, &mut globals, &mut console).evaluate();
    assert_eq!(result, Ok(None));
    assert_eq!(console.output, "hi\n");
}

// ============================================================================
// Intrinsics
// ============================================================================

#[test]
fn test_print() {
    assert_eq!(output("Print(\"a\"); Print(null); PrintLine(3); PrintLine(null);"), "a3\n\n");
}

#[test]
fn test_input() {
    let mut console = BufferConsole::with_input(["world"]);
    let text = "string name = Input(); PrintLine(\"hello \" + name); Input();";
    assert_eq!(run_with(text, &mut console).unwrap(), Some(Value::from("")));
    assert_eq!(console.output, "hello world\n");
}

#[test]
fn test_rand_int() {
    for _ in 0..20 {
        let Some(Value::Int(value)) = run("RandInt(3);").unwrap() else {
            panic!("RandInt should produce an int");
        };
        assert!((0..3).contains(&value));
    }
    assert_eq!(run("RandInt(0);").unwrap(), Some(Value::Int(0)));
}

#[test]
fn test_value_of_null() {
    assert_eq!(run("int x = 2; Value(x);").unwrap(), Some(Value::Int(2)));
    assert_eq!(
        run("int x = null; Value(x);"),
        Err(EvaluationError::Fault(RuntimeFault::NullValue))
    );
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn test_divide_by_zero() {
    assert_eq!(
        run("int x = 0; 1 / x;"),
        Err(EvaluationError::Fault(RuntimeFault::DivideByZero))
    );
}

#[test]
fn test_try_catch_finally() {
    let text = "int x = 0; try { x = 1 / x; PrintLine(\"unreached\"); } catch { PrintLine(\"caught\"); } \
                finally { PrintLine(\"finally\"); }";
    assert_eq!(output(text), "caught\nfinally\n");

    let text = "try { PrintLine(\"body\"); } finally { PrintLine(\"finally\"); }";
    assert_eq!(output(text), "body\nfinally\n");
}

#[test]
fn test_uncaught_fault_runs_finally() {
    let mut console = BufferConsole::new();
    let result = run_with("int x = 0; try { x = 1 / x; } finally { PrintLine(\"finally\"); }", &mut console);
    assert_eq!(result, Err(EvaluationError::Fault(RuntimeFault::DivideByZero)));
    assert_eq!(console.output, "finally\n");
}

#[test]
fn test_break_out_of_try() {
    let text = "int i = 0; while (true) { try { ++i; if (i == 3) break; } catch { } } i;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(3)));
}

#[test]
fn test_faults_unwind_calls() {
    let text = "int Divide(int a, int b) { return a / b; } int r = 0; try { r = Divide(1, 0); } catch { r = -1; } r;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(-1)));
}

#[test]
fn test_unbounded_recursion_faults() {
    assert_eq!(
        run("int F(int n) { return F(n + 1); } F(0);"),
        Err(EvaluationError::Fault(RuntimeFault::StackOverflow(MAX_CALL_DEPTH)))
    );

    let text = "int F(int n) { return F(n + 1); } int r = 0; try { r = F(0); } catch { r = -1; } r;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(-1)));
}

#[test]
fn test_deep_recursion_within_limit() {
    let text = "int Sum(int n) { if (n == 0) return 0; return n + Sum(n - 1); } Sum(5000);";
    assert_eq!(run(text).unwrap(), Some(Value::Int(12_502_500)));
}

#[test]
fn test_labels_survive_repeated_calls() {
    let text = "int Count(int n) { int total = 0; for (int i = 0; i < n; ++i) { if (i == 4) continue; total += i; } \
                return total; } int sum = 0; for (int k = 0; k < 50; ++k) sum += Count(10); sum;";
    assert_eq!(run(text).unwrap(), Some(Value::Int(50 * 41)));
}

// ============================================================================
// Submissions
// ============================================================================

#[test]
fn test_previous_submissions() {
    let mut globals = Globals::new();
    let mut console = BufferConsole::new();

    let arena = Bump::new();
    let first_tree = SyntaxTree::parse(&arena, "int x = 5; int Twice(int n) { return n * 2; }");
    let first_scope = Arc::new(Binder::bind_global_scope(true, None, &[first_tree]).unwrap());
    let first = Arc::new(bind_program(None, &first_scope).unwrap());
    assert_eq!(Evaluator::new(&first, &mut globals, &mut console).evaluate(), Ok(None));
    assert_eq!(globals.len(), 1);

    let second_tree = SyntaxTree::parse(&arena, "Twice(x) + 1;");
    let second_scope = Binder::bind_global_scope(true, Some(first_scope), &[second_tree]).unwrap();
    assert!(second_scope.diagnostics.is_empty());
    let second = bind_program(Some(first), &second_scope).unwrap();
    let result = Evaluator::new(&second, &mut globals, &mut console).evaluate();
    assert_eq!(result, Ok(Some(Value::Int(11))));

    let x = first_scope_variable(&second_scope);
    assert_eq!(globals.get(&x), Some(Value::Int(5)));
}

fn first_scope_variable(scope: &buckle_binder::BoundGlobalScope) -> Arc<buckle_bound::VariableSymbol> {
    scope
        .previous
        .as_ref()
        .and_then(|previous| previous.variables.first().cloned())
        .unwrap()
}

#[test]
fn test_missing_body_is_internal() {
    let program = compile(true, "int F() { return 1; } F();");
    let stripped = BoundProgram {
        previous: None,
        diagnostics: program.diagnostics.clone(),
        main_function: None,
        script_function: program.script_function.clone(),
        functions: program
            .functions
            .iter()
            .filter(|(function, _)| function.name() != "F")
            .map(|(function, body)| (function.clone(), body.clone()))
            .collect(),
    };
    let mut globals = Globals::new();
    let mut console = BufferConsole::new();
    assert_eq!(
        Evaluator::new(&stripped, &mut globals, &mut console).evaluate(),
        Err(EvaluationError::Internal(InternalError::MissingFunctionBody("F".to_string())))
    );
}
