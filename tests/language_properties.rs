// Behaviour every UTL-X implementation must agree on: precedence, navigation,
// coalescing, spread order, short-circuiting, diagnostics and printing.

use utlx_core::diagnostics::{ErrorKind, Section};
use utlx_core::printer::print_program;
use utlx_core::{Codec, Config, JsonCodec, ParseOutcome, Transformation, Udm, parse, validate};

fn eval(expr: &str, input: &str) -> Result<Udm, utlx_core::Error> {
    let script = format!("%utlx 1.0\ninput json\noutput json\n---\n{}", expr);
    let transformation = Transformation::compile(&script, &Config::new(20))?;
    transformation.execute(JsonCodec.decode(input)?)
}

fn json(value: &Udm) -> String {
    JsonCodec.encode(value, false).unwrap()
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(eval("2 + 3 * 4", "null").unwrap(), Udm::Integer(14));
    assert_eq!(eval("2 ** 3 ** 2", "null").unwrap(), Udm::Integer(512));
    assert_eq!(eval("20 * 10 / 5 % 3", "null").unwrap(), Udm::Integer(1));
}

#[test]
fn test_safe_and_unsafe_navigation() {
    let input = r#"{"a": null}"#;
    assert_eq!(eval("$input.a?.b", input).unwrap(), Udm::Null);

    let Err(utlx_core::Error::Evaluation(err)) = eval("$input.a.b", input) else {
        panic!("unsafe navigation through null must fail");
    };
    assert_eq!(err.kind(), ErrorKind::MissingPath);
    assert_eq!(err.primary.section, Section::Content);
}

#[test]
fn test_nullish_coalescing() {
    assert_eq!(eval("null ?? 5", "null").unwrap(), Udm::Integer(5));
    assert_eq!(eval("0 ?? 5", "null").unwrap(), Udm::Integer(0));
    assert_eq!(eval("false ?? 5", "null").unwrap(), Udm::Boolean(false));
    assert_eq!(eval("\"\" ?? 5", "null").unwrap(), Udm::from(""));
    assert_eq!(eval("$input?.x ?? \"d\"", "{}").unwrap(), Udm::from("d"));
}

#[test]
fn test_spread_keeps_key_position() {
    let value = eval("{...{a: 1, b: 2}, b: 3}", "null").unwrap();
    assert_eq!(json(&value), r#"{"a":1,"b":3}"#);
}

#[test]
fn test_short_circuit() {
    assert_eq!(eval("false && undefinedFn()", "null").unwrap(), Udm::Boolean(false));
    assert_eq!(eval("true || undefinedFn()", "null").unwrap(), Udm::Boolean(true));
}

#[test]
fn test_missing_separator_is_one_header_error() {
    let outcome = parse("%utlx 1.0\ninput json\n{ a: 1 }", &Config::new(20));
    let errors: Vec<_> = outcome.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].section, Section::Header);
    assert!(errors[0].message.contains("expected '---' separator"));

    // Parsing continues with the content
    let program = outcome.program().unwrap();
    assert!(!program.content.contains_errors());
}

#[test]
fn test_undefined_variable_is_a_content_error() {
    let report = validate("%utlx 1.0\n---\n{ a: nope }", &Config::new(20), Some(Udm::Null));
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].section, Section::Content);
    assert_eq!(errors[0].kind, ErrorKind::UndefinedVariable);
}

#[test]
fn test_three_malformed_properties() {
    let source = "%utlx 1.0\n---\n{ a: 1, b: , c: 2, d 3, e: 4, : 5, f: 6 }";
    let outcome = parse(source, &Config::new(20));
    assert!(matches!(outcome, ParseOutcome::Partial { .. }));
    assert_eq!(outcome.errors().count(), 3);
}

#[test]
fn test_tainted_binding_reports_once() {
    let report = validate(
        "%utlx 1.0\n---\n{ let x = nope, a: x, b: x + 1, c: upper(x), d: [x] }",
        &Config::new(20),
        Some(Udm::Null),
    );
    assert_eq!(report.errors().count(), 1);
    assert!(report.value.is_none());
}

#[test]
fn test_parse_error_taints_binding() {
    let report = validate(
        "%utlx 1.0\n---\n{ let x = (1 + ), a: x, b: x * 2, c: other }",
        &Config::new(20),
        Some(Udm::Null),
    );
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].kind, ErrorKind::Parse);
    assert_eq!(errors[1].kind, ErrorKind::UndefinedVariable);
}

#[test]
fn test_print_and_reparse() {
    let scripts = [
        "%utlx 1.0\ninput json\noutput xml\n---\n$input.a.b",
        "%utlx 2.1.0\nschema ./s.xsd type:xsd\n---\n-a ** 2 * !b",
        "---\n{ let t = $input.lines |> filter(l => l.qty > 0), @id: $input?.@id, \"a b\": t[0], ...rest }",
        "---\n[1, 2.5, 1e21, 1.7976931348623157e308, \"q\\\"\\n\", true, null, []]",
        "---\nif (a >= 1 && b != c || d ?? e) f(x, y) else (p, q) => p % q",
        "---\nx |> (() => 1) |> g(1) |> h",
    ];
    for script in scripts {
        let config = Config::new(20);
        let first = parse(script, &config);
        assert!(first.is_success(), "{}: {:?}", script, first.diagnostics());
        let printed = print_program(first.program().unwrap());

        let second = parse(&printed, &config);
        assert!(second.is_success(), "{}: {:?}", printed, second.diagnostics());
        assert_eq!(first.program(), second.program(), "{}", printed);
    }
}

#[test]
fn test_overflowing_float_never_reaches_the_printer() {
    let outcome = parse("---\n[1e999]", &Config::new(20));
    assert!(outcome.program().is_some_and(|p| p.content.contains_errors()));
    let errors: Vec<_> = outcome.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Lex);
}
