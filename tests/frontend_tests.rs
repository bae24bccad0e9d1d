//! Parser, printer and validation-pass behavior through the public API

use jasmc::ir::{self, parse_unit};
use jasmc::{compile, Config, Error};

const ROUND_TRIP: &str = r#"
import io.Console;

class Counter extends Object {
    .field private count.i32;

    .construct public Counter().V {
        invokespecial(this, "<init>").V;
        ret.V;
    }

    .method public step(by.i32).i32 {
        t0.i32 := getfield(this, count.i32).i32;
        t1.i32 := t0.i32 +.i32 by.i32;
        putfield(this, count.i32, t1.i32).V;
        ret.i32 t1.i32;
    }
}
"#;

#[test]
fn test_print_then_reparse_preserves_structure() {
    let unit = parse_unit(ROUND_TRIP).expect("parse failed");
    let printed = unit.to_string();
    let reparsed = parse_unit(&printed).unwrap_or_else(|e| panic!("reparse failed: {}\n{}", e, printed));
    assert_eq!(unit, reparsed);
}

#[test]
fn test_parse_error_carries_location() {
    let err = parse_unit("class A {\n  .field num.i32\n}").expect_err("missing semicolon");
    match err {
        Error::Parse { line, .. } => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_lexical_error_is_reported_as_such() {
    let err = parse_unit("class A ? { }").expect_err("bad character");
    assert!(matches!(err, Error::Lexical { .. }));
}

#[test]
fn test_undeclared_label_halts_before_codegen() {
    let err = compile(
        "class A { .method f().V { goto missing_0; ret.V; } }",
        &Config::default(),
    )
    .expect_err("undeclared label");
    let message = err.to_string();
    assert!(message.contains("A.f"), "got: {}", message);
    assert!(message.contains("missing_0"), "got: {}", message);
}

#[test]
fn test_two_labels_on_one_instruction() {
    let unit = parse_unit(
        "class A { .method f().V { goto a_0; a_0: b_0: ret.V; } }",
    )
    .expect("parse failed");
    let method = &unit.methods[0];
    let names: Vec<&str> = method.labels_at(1).map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["a_0", "b_0"]);

    let out = compile(
        "class A { .method f().V { goto a_0; a_0: b_0: ret.V; } }",
        &Config::default(),
    )
    .expect("compile failed");
    assert!(out.contains("a_0:\nb_0:\n\treturn\n"), "got: {}", out);
}

#[test]
fn test_slot_assignment_is_visible_after_prepare() {
    let unit = jasmc::prepare(ROUND_TRIP, &Config::default()).expect("prepare failed");
    let step = unit
        .methods
        .iter()
        .find(|m| m.name == "step")
        .expect("no step method");
    assert_eq!(step.var_table["this"].slot, 0);
    assert_eq!(step.var_table["by"].slot, 1);
    assert_eq!(step.var_table["t0"].slot, 2);
    assert_eq!(step.var_table["t1"].slot, 3);
}

#[test]
fn test_printer_renders_instruction_forms() {
    let unit = parse_unit(ROUND_TRIP).expect("parse failed");
    let printed = unit.to_string();
    assert!(printed.contains("import io.Console;"), "got: {}", printed);
    assert!(printed.contains("class Counter extends Object {"), "got: {}", printed);
    assert!(printed.contains(".field private count.i32;"), "got: {}", printed);
    assert!(
        printed.contains("t1.i32 := t0.i32 +.i32 by.i32;"),
        "got: {}",
        printed
    );
    assert!(
        printed.contains("putfield(this, count.i32, t1.i32).V;"),
        "got: {}",
        printed
    );
}

#[test]
fn test_check_accepts_backward_jump_in_guard() {
    let source = "class A { .method f(x.i32).V { \
        l0: if (x.i32 <.bool 0.i32) goto l0; ret.V; } }";
    let unit = jasmc::prepare(source, &Config::default()).expect("prepare failed");
    assert!(ir::check::check_labels(&unit).is_ok());
}
