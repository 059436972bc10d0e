use minic_compiler::ir::{BinaryOp, Instr, Label, Module, UnaryOp};
use minic_compiler::{generate, Parser, Type};

fn gen(src: &str) -> Module {
    let mut p = Parser::from_source(src).expect("lexing failed");
    let unit = p.parse_compile_unit().expect("parse error");
    generate(&unit).expect("ir generation expected OK")
}

#[test]
fn minimal_function_dump() {
    let m = gen("int main() { return 0; }");
    let id = m.find_function("main").unwrap();
    let expected = "define i32 @main() {\n\
                    \tentry\n\
                    \t%ret = 0\n\
                    \tgoto L0\n\
                    L0:\n\
                    \texit %ret\n\
                    }\n";
    assert_eq!(m.dump_function(id), expected);
}

#[test]
fn params_and_calls_render() {
    let m = gen("int add(int a, int b) { return a + b; }\nint main() { return add(2, 40); }");
    let dump = m.dump();
    assert!(dump.contains("define i32 @add(i32 %a, i32 %b) {"));
    assert!(dump.contains("\t%t0 = %a.0 add_I %b.1\n"));
    assert!(dump.contains(" = i32 @add(2, 40)\n"));
}

#[test]
fn void_calls_render_without_a_destination() {
    let m = gen("void p(int x) { return; }\nint main() { p(7); return 0; }");
    let dump = m.dump();
    assert!(dump.contains("define void @p(i32 %x) {"));
    assert!(dump.contains("\tvoid @p(7)\n"));
    assert!(dump.contains("\texit\n"));
}

#[test]
fn globals_render_before_functions() {
    let m = gen("int g;\nint main() { g = 1; return g; }");
    let dump = m.dump();
    assert!(dump.starts_with("global i32 @g\n"));
    assert!(dump.contains("\t@g = 1\n"));
}

#[test]
fn branches_and_labels_render() {
    let m = gen("int main() { int i; i = 0; while (i < 3) { i = i + 1; } return i; }");
    let dump = m.dump();
    assert!(dump.contains("\t%t0 = %i.0 lt_I 3\n"));
    assert!(dump.contains("\tbt %t0, L2\n"));
    assert!(dump.contains("L1:\n"));
    assert!(dump.contains("\tgoto L1\n"));
}

#[test]
fn every_instruction_form_renders() {
    // build a function by hand to cover the two-way branch as well
    let mut m = Module::new();
    let exit = Label(0);
    let fid = m.new_function("probe", Type::Int, exit).unwrap();
    m.set_current_function(Some(fid));
    let a = m.new_var_value(Type::Int, "a");
    let t = m.new_temp_value(Type::Bool);
    let n = m.new_temp_value(Type::Int);
    let one = m.new_const_int(1);
    let ret = m.new_ret_value(Type::Int);
    m.func_mut(fid).return_value = Some(ret);
    m.set_current_function(None);

    let lt = Label(1);
    let lf = Label(2);
    m.func_mut(fid).code = vec![
        Instr::Entry,
        Instr::Binary { op: BinaryOp::Gt, dst: t, lhs: a, rhs: one },
        Instr::BranchCond { cond: t, true_target: lt, false_target: lf },
        Instr::Label(lt),
        Instr::Unary { op: UnaryOp::Neg, dst: n, src: a },
        Instr::Move { dst: ret, src: n },
        Instr::Goto(exit),
        Instr::Label(lf),
        Instr::Move { dst: ret, src: one },
        Instr::Goto(exit),
        Instr::Label(exit),
        Instr::Exit(Some(ret)),
    ];

    let dump = m.dump_function(fid);
    assert!(dump.contains("\t%t0 = %a.0 gt_I 1\n"));
    assert!(dump.contains("\tbc %t0, L1, L2\n"));
    assert!(dump.contains("\t%t1 = neg %a.0\n"));
    assert!(dump.contains("\t%ret = %t1\n"));
    assert!(dump.contains("L2:\n"));
    assert!(dump.contains("\tgoto L0\n"));
    assert!(dump.contains("\texit %ret\n"));
}
