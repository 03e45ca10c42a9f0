use utlx_core::udm::Object;
use utlx_core::{Codec, Config, ErrorKind, JsonCodec, Limits, Transformation, Udm};

fn json(text: &str) -> Udm {
    JsonCodec.decode(text).unwrap()
}

fn run_with(expr: &str, input: Udm, config: &Config) -> Result<Udm, ErrorKind> {
    let script = format!("%utlx 1.0\ninput json\noutput json\n---\n{}", expr);
    let transformation = Transformation::compile(&script, config).unwrap();
    transformation.execute(input).map_err(|e| match e {
        utlx_core::Error::Evaluation(e) => e.kind(),
        other => panic!("unexpected error: {}", other),
    })
}

fn run(expr: &str, input: &str) -> Result<Udm, ErrorKind> {
    run_with(expr, json(input), &Config::new(20))
}

fn eval(expr: &str) -> Udm {
    run(expr, "null").unwrap()
}

fn to_json(value: &Udm) -> String {
    JsonCodec.encode(value, false).unwrap()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval("7 % 4 + 10 / 4"), Udm::Float(5.5));
    assert_eq!(eval("-(2 + 3)"), Udm::Integer(-5));
    assert_eq!(eval("0.1 + 0.2 == 0.30000000000000004"), Udm::Boolean(true));
    assert_eq!(eval("2 ** -1"), Udm::Float(0.5));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(run("1 / 0", "null"), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("1 % 0", "null"), Err(ErrorKind::TypeMismatch));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("\"n=\" + 3"), Udm::from("n=3"));
    assert_eq!(eval("1 + \"\" + true"), Udm::from("1true"));
    assert_eq!(run("\"x\" + null", "null"), Err(ErrorKind::TypeMismatch));
}

#[test]
fn test_equality_is_type_sensitive() {
    assert_eq!(eval("1 == 1.0"), Udm::Boolean(true));
    assert_eq!(eval("1 == \"1\""), Udm::Boolean(false));
    assert_eq!(eval("[1, {a: null}] == [1, {a: null}]"), Udm::Boolean(true));
    assert_eq!(eval("null != false"), Udm::Boolean(true));
}

#[test]
fn test_relational_operators_need_matching_kinds() {
    assert_eq!(eval("\"abc\" < \"abd\""), Udm::Boolean(true));
    assert_eq!(eval("2 >= 1.5"), Udm::Boolean(true));
    assert_eq!(run("1 < \"2\"", "null"), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("null < 1", "null"), Err(ErrorKind::TypeMismatch));
}

#[test]
fn test_logical_operators_need_booleans() {
    assert_eq!(run("1 && true", "null"), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("!\"yes\"", "null"), Err(ErrorKind::TypeMismatch));
    assert_eq!(eval("!(1 > 2) || x"), Udm::Boolean(true));
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_member_access() {
    let input = r#"{"order": {"@id": "A-1", "lines": [{"sku": "x"}, {"sku": "y"}]}}"#;
    assert_eq!(run("$input.order.@id", input), Ok(Udm::from("A-1")));
    assert_eq!(run("$input.order.lines[1].sku", input), Ok(Udm::from("y")));
    assert_eq!(run("$input.order.lines[-1].sku", input), Ok(Udm::from("y")));
    assert_eq!(run("$input[\"order\"].lines[0][\"sku\"]", input), Ok(Udm::from("x")));
}

#[test]
fn test_missing_paths() {
    let input = r#"{"a": null, "b": {"c": 1}, "n": 5}"#;
    assert_eq!(run("$input.b.missing", input), Err(ErrorKind::MissingPath));
    assert_eq!(run("$input.b?.missing", input), Ok(Udm::Null));
    assert_eq!(run("$input.b.@missing", input), Err(ErrorKind::MissingPath));
    assert_eq!(run("$input.a", input), Ok(Udm::Null));
    assert_eq!(run("$input.n.x", input), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("$input.n?.x", input), Err(ErrorKind::TypeMismatch));
}

#[test]
fn test_indexing_errors() {
    let input = r#"{"items": [1, 2]}"#;
    assert_eq!(run("$input.items[2]", input), Err(ErrorKind::MissingPath));
    assert_eq!(run("$input.items[-3]", input), Err(ErrorKind::MissingPath));
    assert_eq!(run("$input.items[\"0\"]", input), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("$input?.missing?.x[0]", input), Err(ErrorKind::MissingPath));
}

// ============================================================================
// Functions and closures
// ============================================================================

#[test]
fn test_pipes() {
    assert_eq!(eval("[1, 2, 3] |> count()"), Udm::Integer(3));
    assert_eq!(eval("\"ab\" |> upper"), Udm::from("AB"));
    assert_eq!(eval("4 |> (v => v + 1)"), Udm::Integer(5));
    assert_eq!(eval("[1, 2, 3] |> map(x => x * 2) |> sum()"), Udm::Integer(12));
    assert_eq!(eval("\"a,b\" |> split(\",\") |> join(\"-\")"), Udm::from("a-b"));
}

#[test]
fn test_higher_order_builtins() {
    let input = r#"{"lines": [{"qty": 2, "price": 1.5}, {"qty": 1, "price": 4}]}"#;
    assert_eq!(
        run("sum($input.lines, l => l.qty * l.price)", input),
        Ok(Udm::Integer(7))
    );
    assert_eq!(
        run("$input.lines |> filter(l => l.qty > 1) |> count()", input),
        Ok(Udm::Integer(1))
    );
}

#[test]
fn test_closures_capture_their_scope() {
    let value = eval("{ let base = 10, let add = x => x + base, r: [1, 2] |> map(add) }");
    assert_eq!(to_json(&value), r#"{"r":[11,12]}"#);
}

#[test]
fn test_local_names_shadow_builtins() {
    let value = eval("{ let count = x => 42, n: count([1]) }");
    assert_eq!(to_json(&value), r#"{"n":42}"#);
}

#[test]
fn test_call_errors() {
    assert_eq!(run("nothing(1)", "null"), Err(ErrorKind::UndefinedVariable));
    assert_eq!(run("count(1)", "null"), Err(ErrorKind::FunctionCall));
    assert_eq!(run("count()", "null"), Err(ErrorKind::FunctionCall));
    assert_eq!(run("(x => x)()", "null"), Err(ErrorKind::FunctionCall));
    assert_eq!(run("{ let f = 1, r: f(2) }", "null"), Err(ErrorKind::TypeMismatch));
    assert_eq!(run("map([1], x => y)", "null"), Err(ErrorKind::UndefinedVariable));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_object_literals() {
    let value = eval("{ let t = 2, @id: 7, b: t, a: [t, t * 2] }");
    let Udm::Object(object) = &value else {
        panic!("expected an object");
    };
    assert_eq!(object.attribute("id"), Some("7"));
    assert_eq!(to_json(&value), r#"{"@id":"7","b":2,"a":[2,4]}"#);
}

#[test]
fn test_spread_needs_an_object() {
    assert_eq!(run("{ ...[1] }", "null"), Err(ErrorKind::TypeMismatch));
    let input = Udm::Object(Object::new().with_property("x", Udm::Integer(1)));
    let value = run_with("{ y: 0, ...$input, y: 2 }", input, &Config::new(20)).unwrap();
    assert_eq!(to_json(&value), r#"{"y":2,"x":1}"#);
}

#[test]
fn test_conditional() {
    assert_eq!(eval("if (1 > 2) missing else \"no\""), Udm::from("no"));
    assert_eq!(run("if (1) 2 else 3", "null"), Err(ErrorKind::TypeMismatch));
}

// ============================================================================
// Budgets
// ============================================================================

#[test]
fn test_recursion_limit() {
    let config = Config::new(20).limits(Limits {
        max_depth: 10,
        max_steps: None,
    });
    assert_eq!(
        run_with("((f) => f(f))((f) => f(f))", Udm::Null, &config),
        Err(ErrorKind::ResourceExhausted)
    );
}

#[test]
fn test_default_depth_fits_a_spawned_thread() {
    let handle = std::thread::spawn(|| {
        let config = Config::new(20);
        let chain = vec!["1"; 120].join(" + ");
        let sum = run_with(&chain, Udm::Null, &config);
        let runaway = run_with("((f) => f(f))((f) => f(f))", Udm::Null, &config);
        let too_long = format!("%utlx 1.0\n---\n{}", vec!["1"; 200].join(" + "));
        let compiled = Transformation::compile(&too_long, &config).map(|_| ());
        (sum, runaway, compiled)
    });
    let (sum, runaway, compiled) = handle.join().unwrap();
    assert_eq!(sum, Ok(Udm::Integer(120)));
    assert_eq!(runaway, Err(ErrorKind::ResourceExhausted));
    let Err(utlx_core::Error::Compile(diagnostics)) = compiled else {
        panic!("expected the 200-term chain to be rejected");
    };
    assert_eq!(
        diagnostics.last().map(|d| d.kind),
        Some(ErrorKind::ResourceExhausted)
    );
}

#[test]
fn test_step_budget_covers_builtin_iteration() {
    let config = Config::new(20).limits(Limits {
        max_depth: 64,
        max_steps: Some(50),
    });
    let input = Udm::Array((0..100).map(Udm::Integer).collect());
    assert_eq!(
        run_with("count($input)", input.clone(), &config),
        Ok(Udm::Integer(100))
    );
    assert_eq!(
        run_with("$input |> map(x => x)", input, &config),
        Err(ErrorKind::ResourceExhausted)
    );
}
