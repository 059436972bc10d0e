use minic_compiler::error::SemanticErrorKind;
use minic_compiler::{generate, Parser};

fn gen_err(src: &str) -> SemanticErrorKind {
    let mut p = Parser::from_source(src).expect("lexing failed");
    let unit = p.parse_compile_unit().expect("parse error");
    match generate(&unit) {
        Ok(_) => panic!("ir generation should fail but succeeded"),
        Err(e) => e.kind,
    }
}

fn gen_err_line(src: &str) -> usize {
    let mut p = Parser::from_source(src).expect("lexing failed");
    let unit = p.parse_compile_unit().expect("parse error");
    match generate(&unit) {
        Ok(_) => panic!("ir generation should fail but succeeded"),
        Err(e) => e.pos.line,
    }
}

#[test]
fn duplicate_function() {
    assert_eq!(
        gen_err("int f() { return 0; }\nint f() { return 1; }\nint main() { return 0; }"),
        SemanticErrorKind::DuplicateFunction { name: "f".into() }
    );
}

#[test]
fn undefined_function() {
    assert_eq!(
        gen_err("int main() { return g(); }"),
        SemanticErrorKind::UndefinedFunction { name: "g".into() }
    );
    // definition order matters: use before definition is an error
    assert_eq!(
        gen_err("int main() { return f(); }\nint f() { return 1; }"),
        SemanticErrorKind::UndefinedFunction { name: "f".into() }
    );
}

#[test]
fn arity_mismatch_both_directions() {
    assert_eq!(
        gen_err("int f(int x) { return x; }\nint main() { return f(); }"),
        SemanticErrorKind::ArityMismatch { name: "f".into(), expected: 1, got: 0 }
    );
    assert_eq!(
        gen_err("int f() { return 0; }\nint main() { return f(1); }"),
        SemanticErrorKind::ArityMismatch { name: "f".into(), expected: 0, got: 1 }
    );
}

#[test]
fn break_and_continue_need_a_loop() {
    assert_eq!(gen_err("int main() { break; }"), SemanticErrorKind::BreakOutsideLoop);
    assert_eq!(gen_err("int main() { continue; }"), SemanticErrorKind::ContinueOutsideLoop);
    // a finished loop no longer provides a context
    assert_eq!(
        gen_err("int main() { while (0) { } break; }"),
        SemanticErrorKind::BreakOutsideLoop
    );
    // an if inside a loop does
    let mut p = Parser::from_source("int main() { while (1) { if (1) break; } return 0; }").unwrap();
    let unit = p.parse_compile_unit().unwrap();
    assert!(generate(&unit).is_ok());
}

#[test]
fn unresolved_identifiers_surface_at_the_leaf() {
    assert_eq!(
        gen_err("int main() { return x; }"),
        SemanticErrorKind::UnresolvedIdentifier { name: "x".into() }
    );
    assert_eq!(
        gen_err("int main() { x = 1; return 0; }"),
        SemanticErrorKind::UnresolvedIdentifier { name: "x".into() }
    );
    assert_eq!(
        gen_err("int main() { int a; a = b + 1; return a; }"),
        SemanticErrorKind::UnresolvedIdentifier { name: "b".into() }
    );
}

#[test]
fn void_call_is_not_a_value() {
    assert_eq!(
        gen_err("void p() { }\nint main() { return p(); }"),
        SemanticErrorKind::VoidValue
    );
    assert_eq!(
        gen_err("void p() { }\nint main() { int x; x = 1 + p(); return x; }"),
        SemanticErrorKind::VoidValue
    );
}

#[test]
fn errors_carry_the_source_line() {
    assert_eq!(gen_err_line("int main() {\n\n return nope;\n}"), 3);
    assert_eq!(gen_err_line("int f(int x) { return x; }\nint main() { return f(1, 2); }"), 2);
}

#[test]
fn failure_aborts_the_whole_translation() {
    // the first failing item stops everything, no partial module escapes
    let mut p = Parser::from_source("int main() { return g(); }\nint late() { return 0; }").unwrap();
    let unit = p.parse_compile_unit().unwrap();
    assert!(generate(&unit).is_err());
}
