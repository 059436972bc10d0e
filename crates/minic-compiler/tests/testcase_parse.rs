use std::fs;
use std::path::PathBuf;

use minic_compiler::{generate, Parser};

#[test]
fn compile_repository_testcase_main_mc() {
    // crates/minic-compiler -> repo root -> testcase/main.mc
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../testcase/main.mc");
    let src = fs::read_to_string(&path).expect("failed to read testcase/main.mc");
    let mut p = Parser::from_source(&src).expect("lexer ok");
    let unit = match p.parse_compile_unit() {
        Ok(unit) => unit,
        Err(e) => panic!("parse error: {}", e),
    };
    let module = match generate(&unit) {
        Ok(m) => m,
        Err(e) => panic!("semantic error: {}", e),
    };
    assert_eq!(module.globals().len(), 1);
    assert!(module.find_function("add").is_some());
    assert!(module.find_function("triangular").is_some());
    assert!(module.find_function("main").is_some());
    let dump = module.dump();
    assert!(dump.contains("define i32 @triangular(i32 %n) {"));
}
