//! End-to-end semantic analysis tests through the public API

use cool_compiler::frontend::CoolParser;
use cool_compiler::frontend::ast::{ExprKind, Feature, Program};
use cool_compiler::{Analysis, Analyzer, ErrorKind, SemantConfig, Type, analyze};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> Program {
    CoolParser::new(source, "test.cl")
        .parse_program()
        .expect("test program should parse")
}

fn run(source: &str) -> (Program, Analysis) {
    let mut program = parse(source);
    let analysis = analyze(&mut program);
    (program, analysis)
}

fn messages(analysis: &Analysis) -> Vec<String> {
    analysis.diagnostics.iter().map(|d| d.to_string()).collect()
}

#[test]
fn hello_world_has_no_diagnostics() {
    let (program, analysis) = run(r#"class Main inherits IO { main(): Object { out_string("ok") }; };"#);
    assert!(analysis.is_ok(), "{:?}", messages(&analysis));

    let Feature::Method(main) = &program.classes[0].features[0] else {
        panic!("expected method");
    };
    assert_eq!(main.body.ty, Some(Type::SelfType));
}

#[test]
fn adding_int_and_string_is_one_type_error() {
    let (_, analysis) = run(r#"class Main { main(): Object { 1 + "x" }; };"#);
    assert!(!analysis.is_ok());
    assert_eq!(analysis.error_count(), 1);
    assert_eq!(analysis.diagnostics[0].kind, ErrorKind::Type);
    assert_eq!(messages(&analysis), vec!["test.cl:1: non-Int arguments: Int + String"]);
}

#[test]
fn let_initializer_mismatch_is_one_diagnostic() {
    let (_, analysis) = run(r#"class Main { main(): Object { let x: Int <- "str" in x }; };"#);
    assert_eq!(analysis.error_count(), 1);
    assert!(analysis.diagnostics[0].message.contains("does not conform"));
}

#[test]
fn missing_main_class_is_one_diagnostic() {
    let (_, analysis) = run("class A { f() : Int { 1 }; };");
    assert_eq!(messages(&analysis), vec!["Class Main is not defined."]);
    assert!(!analysis.is_ok());
}

#[test]
fn main_without_zero_argument_main_is_one_diagnostic() {
    let (_, analysis) = run("class Main { main(x : Int) : Int { x }; };");
    assert_eq!(analysis.error_count(), 1);
    assert_eq!(analysis.diagnostics[0].kind, ErrorKind::Structural);

    let (_, analysis) = run("class Main { start() : Int { 1 }; };");
    assert_eq!(analysis.error_count(), 1);
}

#[test]
fn inheritance_cycle_suppresses_expression_errors() {
    let source = "class Main { main() : Object { 0 }; };
        class A inherits B { f() : Int { true + undefined_thing }; };
        class B inherits A { g() : Bool { 1 }; };";
    let (_, analysis) = run(source);

    assert_eq!(analysis.error_count(), 1);
    assert_eq!(analysis.diagnostics[0].kind, ErrorKind::Structural);
    assert!(analysis.diagnostics[0].message.contains("inheritance cycle"));
    assert!(!analysis.classes.is_resolved("A"));
    assert!(!analysis.classes.is_resolved("B"));
}

#[test]
fn redefining_basic_classes_is_structural() {
    for source in [
        "class Main { main() : Object { 0 }; }; class Int inherits Object { };",
        "class Main { main() : Object { 0 }; }; class SELF_TYPE { };",
    ] {
        let (_, analysis) = run(source);
        assert_eq!(analysis.error_count(), 1, "{}", source);
        assert_eq!(analysis.diagnostics[0].kind, ErrorKind::Structural);
    }
}

#[test]
fn inheriting_from_string_is_rejected() {
    let (_, analysis) = run("class Main { main() : Object { 0 }; }; class C inherits String { };");
    assert_eq!(messages(&analysis), vec!["test.cl:1: Class C cannot inherit class String."]);
}

#[test]
fn override_signatures() {
    let base = "class Main { main() : Object { 0 }; };
        class A { foo(x : Int) : Int { x }; };";

    let (_, analysis) = run(&format!("{} class B inherits A {{ foo(x : String) : Int {{ 1 }}; }};", base));
    assert_eq!(analysis.error_count(), 1);
    assert_eq!(analysis.diagnostics[0].kind, ErrorKind::Declaration);

    let (_, analysis) = run(&format!("{} class B inherits A {{ foo(x : Int) : Int {{ x + 1 }}; }};", base));
    assert!(analysis.is_ok(), "{:?}", messages(&analysis));
}

#[test]
fn new_self_type_takes_the_receiver_type() {
    let source = "class C { clone_me() : SELF_TYPE { new SELF_TYPE }; };
        class D inherits C { };
        class Main { main() : Object { (new D).clone_me() }; };";
    let (program, analysis) = run(source);
    assert!(analysis.is_ok(), "{:?}", messages(&analysis));

    let main = program.classes.iter().find(|c| c.name == "Main").unwrap();
    let Feature::Method(method) = &main.features[0] else {
        panic!("expected method");
    };
    assert!(matches!(method.body.kind, ExprKind::Dispatch { .. }));
    assert_eq!(method.body.ty, Some(Type::class("D")));
}

#[test]
fn conformance_errors_do_not_stop_later_checks() {
    let source = "class Main {
        main() : Object { {
            a;
            b;
            if 1 then 2 else 3 fi;
        } };
    };";
    let (_, analysis) = run(source);
    assert_eq!(
        messages(&analysis),
        vec![
            "test.cl:3: Undeclared identifier a.",
            "test.cl:4: Undeclared identifier b.",
            "test.cl:5: Predicate of 'if' does not have type Bool.",
        ]
    );
}

#[test]
fn diagnostics_are_deterministic() {
    let source = "class Main { main() : Object { x }; y : Nope; };
        class A inherits Gone { };
        class B { f() : Int { \"s\" }; };";
    let (_, first) = run(source);
    let (_, second) = run(source);
    assert_eq!(messages(&first), messages(&second));
    assert_eq!(first.error_count(), 4);
}

#[test]
fn error_limit_halts_analysis() {
    let body: String = (0..60).map(|i| format!("u{};", i)).collect();
    let source = format!("class Main {{ main() : Object {{ {{ {} }} }}; }};", body);

    let mut program = parse(&source);
    let analysis = analyze(&mut program);
    assert!(analysis.halted);
    assert_eq!(analysis.error_count(), 51);

    let mut program = parse(&source);
    let analysis = Analyzer::new(SemantConfig { max_errors: None }).analyze(&mut program);
    assert!(!analysis.halted);
    assert_eq!(analysis.error_count(), 60);
}
