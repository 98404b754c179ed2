//! Diagnostic tests: every semantic error kind, error accumulation, and the
//! phase separation between syntax, analysis, and execution.

use minic::parser::Parser;
use minic::semantics::{NarrowingPolicy, SemanticAnalyzer, SemanticError};

fn diagnose(source: &str) -> Vec<SemanticError> {
    let program = Parser::new(source)
        .expect("lexing failed")
        .parse_program()
        .expect("parsing failed");
    SemanticAnalyzer::new()
        .analyze(&program)
        .expect_err("expected semantic errors")
}

fn diagnose_with(source: &str, policy: NarrowingPolicy) -> Result<(), Vec<SemanticError>> {
    let program = Parser::new(source)
        .expect("lexing failed")
        .parse_program()
        .expect("parsing failed");
    SemanticAnalyzer::with_narrowing(policy).analyze(&program)
}

#[test]
fn undeclared_variable() {
    let errors = diagnose("int b = c + 5; int main() { return b; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::UndeclaredIdentifier { name, .. } if name == "c"
    )));
}

#[test]
fn undeclared_function() {
    let errors = diagnose("int main() { return mystery(); }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::UndeclaredIdentifier { name, .. } if name == "mystery"
    )));
}

#[test]
fn string_literal_in_int_context() {
    let errors = diagnose("int d = \"string\"; int main() { return d; }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::TypeMismatch { found, .. } if found == "string literal")));
}

#[test]
fn string_concatenation_is_a_type_error() {
    let errors = diagnose("int j = \"hello\" + \"world\"; int main() { return j; }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::TypeMismatch { .. })));
}

#[test]
fn redeclaration_in_same_scope() {
    let errors = diagnose("int e = 10; int e = 20; int main() { return e; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::Redeclaration { name, .. } if name == "e"
    )));
}

#[test]
fn constant_index_out_of_range() {
    let errors = diagnose("int main() { int arr[5]; return arr[10]; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::ConstantIndexOutOfRange {
            index: 10,
            size: 5,
            ..
        }
    )));
}

#[test]
fn negative_constant_index() {
    let errors = diagnose("int main() { int arr[5]; return arr[-1]; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::ConstantIndexOutOfRange { index: -1, .. }
    )));
}

#[test]
fn constant_division_by_zero() {
    let errors = diagnose("int g = 10 / 0; int main() { return g; }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::ConstantDivisionByZero { .. })));
}

#[test]
fn constant_modulo_by_zero() {
    let errors = diagnose("int main() { return 7 % (3 - 3); }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::ConstantDivisionByZero { .. })));
}

#[test]
fn missing_return_in_non_void_function() {
    let errors = diagnose("int get_val() { int x = 10; } int main() { return get_val(); }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::MissingReturn { function, .. } if function == "get_val"
    )));
}

#[test]
fn void_function_needs_no_return() {
    let source = "void noop() { int x = 1; } int main() { noop(); return 0; }";
    let program = Parser::new(source).unwrap().parse_program().unwrap();
    assert!(SemanticAnalyzer::new().analyze(&program).is_ok());
}

#[test]
fn arity_mismatch() {
    let errors = diagnose(
        "int add(int x, int y) { return x + y; } int h = add(1, 2, 3); \
         int main() { return h; }",
    );
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::ArityMismatch {
            function,
            expected: 2,
            found: 3,
            ..
        } if function == "add"
    )));
}

#[test]
fn variable_used_outside_its_scope() {
    let errors = diagnose(
        "int main() { if (1) { int scoped = 10; } return scoped; }",
    );
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::UndeclaredIdentifier { name, .. } if name == "scoped"
    )));
}

#[test]
fn break_and_continue_outside_loops() {
    let errors = diagnose("break; continue; int main() { return 0; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::InvalidControlContext {
            construct: "break",
            ..
        }
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::InvalidControlContext {
            construct: "continue",
            ..
        }
    )));
}

#[test]
fn return_outside_function() {
    let errors = diagnose("return 5; int main() { return 0; }");
    assert!(errors.iter().any(|e| matches!(
        e,
        SemanticError::InvalidControlContext {
            construct: "return",
            ..
        }
    )));
}

#[test]
fn break_inside_loop_is_fine() {
    let source = "int main() { while (1) { break; } return 0; }";
    let program = Parser::new(source).unwrap().parse_program().unwrap();
    assert!(SemanticAnalyzer::new().analyze(&program).is_ok());
}

#[test]
fn narrowing_policy_controls_lossy_conversions() {
    let source = "int main() { float pi = 3.14; char ch = pi; return ch; }";
    assert!(diagnose_with(source, NarrowingPolicy::Truncate).is_ok());

    let errors = diagnose_with(source, NarrowingPolicy::Reject).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::TypeMismatch { .. })));
}

#[test]
fn modulo_on_floating_operand() {
    let errors = diagnose("int main() { double d = 1.5; return d % 2; }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::TypeMismatch { .. })));
}

#[test]
fn bitwise_on_floating_operand() {
    let errors = diagnose("int main() { double d = 1.5; return d & 3; }");
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::TypeMismatch { .. })));
}

#[test]
fn all_diagnostics_reported_together() {
    // One pass reports every problem, not just the first
    let source = r#"
        int b = c + 5;
        int e = 10;
        int e = 20;
        break;
        int main() {
            int arr[5];
            return arr[10];
        }
    "#;
    let errors = diagnose(source);
    assert!(errors.len() >= 4, "got {} errors: {:?}", errors.len(), errors);
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::UndeclaredIdentifier { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::Redeclaration { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::InvalidControlContext { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, SemanticError::ConstantIndexOutOfRange { .. })));
}

#[test]
fn diagnostics_carry_locations() {
    let errors = diagnose("int main() {\n    return missing;\n}");
    assert_eq!(errors[0].location().line, 2);
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    let mut parser = Parser::new("int a = 5\nint main() { return a; }").unwrap();
    assert!(parser.parse_program().is_err());
}

#[test]
fn unrecognized_character_is_a_lex_error() {
    assert!(Parser::new("int main() { return 1 $ 2; }").is_err());
}
