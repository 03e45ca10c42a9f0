use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use utlx_core::diagnostics::{ErrorKind, Severity};
use utlx_core::evaluator::CancellationToken;
use utlx_core::stdlib::{CallContext, FunctionSignature, ParamType, Stdlib, StdlibError};
use utlx_core::transformation::validate_with;
use utlx_core::udm::Object;
use utlx_core::{Builtins, Codec, Config, Error, JsonCodec, Transformation, Udm, validate};

const ORDER_SCRIPT: &str = r#"%utlx 1.0
input json
output json
---
{
  let lines = $input.order.lines,
  @id: $input.order.@id,
  customer: upper($input.order?.customer?.name ?? "unknown"),
  total: sum(lines, l => l.qty * l.price),
  skus: lines |> map(l => l.sku) |> join(";")
}"#;

#[test]
fn test_order_transformation() {
    let transformation = Transformation::compile(ORDER_SCRIPT, &Config::new(20)).unwrap();
    assert!(transformation.warnings().is_empty());
    assert_eq!(transformation.program().input_format(), Some("json"));

    let input = JsonCodec
        .decode(
            r#"{"order": {"@id": "17", "lines": [
                {"sku": "a", "qty": 2, "price": 2.5},
                {"sku": "b", "qty": 1, "price": 10}
            ]}}"#,
        )
        .unwrap();
    let output = transformation.execute(input).unwrap();
    assert_eq!(
        JsonCodec.encode(&output, false).unwrap(),
        r#"{"@id":"17","customer":"UNKNOWN","total":15,"skus":"a;b"}"#
    );
}

#[test]
fn test_compile_error_carries_every_diagnostic() {
    let Err(Error::Compile(diagnostics)) =
        Transformation::compile("%utlx 1.0\n---\n[1 +, 2 *]", &Config::new(20))
    else {
        panic!("expected a compile error");
    };
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_warnings_do_not_block_compilation() {
    let transformation =
        Transformation::compile("%utlx 1.0\n%utlx 1.1\n---\n1", &Config::new(20)).unwrap();
    assert_eq!(transformation.warnings().len(), 1);
    assert_eq!(transformation.warnings()[0].severity, Severity::Warning);
    assert_eq!(transformation.program().version(), Some("1.1"));
}

#[test]
fn test_strict_execution_stops_at_first_fault() {
    let transformation =
        Transformation::compile("%utlx 1.0\n---\n[a, b, c]", &Config::new(20)).unwrap();
    let Err(Error::Evaluation(err)) = transformation.execute(Udm::Null) else {
        panic!("expected an evaluation error");
    };
    assert_eq!(err.diagnostics.len(), 1);
    assert!(err.primary.message.contains("'a'"));
    assert_eq!(err.location().line, 3);
}

#[test]
fn test_validate_collects_evaluation_faults() {
    let report = validate("%utlx 1.0\n---\n[a, b, c]", &Config::new(20), Some(Udm::Null));
    assert_eq!(report.errors().count(), 3);
    assert!(!report.aborted);
}

#[test]
fn test_validate_without_input_only_parses() {
    let report = validate("%utlx 1.0\n---\n[a, b, c]", &Config::new(20), None);
    assert!(!report.has_errors());
}

#[test]
fn test_error_ceiling_spans_both_phases() {
    let report = validate("%utlx 1.0\n---\n[1 +, a, b, c]", &Config::new(3), Some(Udm::Null));
    let kinds: Vec<_> = report.errors().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::Parse,
            ErrorKind::UndefinedVariable,
            ErrorKind::UndefinedVariable,
            ErrorKind::TooManyErrors,
        ]
    );
    assert!(report.aborted);
}

#[test]
fn test_fail_fast_validation() {
    let config = Config::new(20).fail_fast(true);
    let report = validate("%utlx 1.0\n---\n[a, b]", &config, Some(Udm::Null));
    assert_eq!(report.errors().count(), 1);
    assert!(report.aborted);
}

#[test]
fn test_cancellation() {
    let token = CancellationToken::new();
    let transformation = Transformation::compile("%utlx 1.0\n---\n$input", &Config::new(20))
        .unwrap()
        .with_cancellation(token.clone());
    assert_eq!(transformation.execute(Udm::Integer(1)).unwrap(), Udm::Integer(1));

    token.cancel();
    let Err(Error::Evaluation(err)) = transformation.execute(Udm::Integer(1)) else {
        panic!("expected cancellation");
    };
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn test_shared_across_threads() {
    let transformation =
        Transformation::compile("%utlx 1.0\n---\n$input.n * 2", &Config::new(20)).unwrap();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let transformation = &transformation;
                scope.spawn(move || {
                    let input = Udm::Object(Object::new().with_property("n", Udm::Integer(n)));
                    transformation.execute(input).unwrap()
                })
            })
            .collect();
        for (n, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Udm::Integer(n as i64 * 2));
        }
    });
}

/// A registry with one function that calls its argument twice.
struct Twice;

impl Stdlib for Twice {
    fn resolve(&self, name: &str) -> Option<FunctionSignature> {
        (name == "twice").then(|| {
            FunctionSignature::new("twice")
                .param("f", ParamType::Function)
                .param("x", ParamType::Any)
        })
    }

    fn invoke(
        &self,
        _name: &str,
        args: Vec<Udm>,
        cx: &mut CallContext<'_, '_>,
    ) -> Result<Udm, StdlibError> {
        let [f, x]: [Udm; 2] = args
            .try_into()
            .map_err(|_| StdlibError::Failed("expected two arguments".to_string()))?;
        let once = cx.apply(&f, vec![x])?;
        cx.apply(&f, vec![once])
    }
}

#[test]
fn test_custom_stdlib() {
    let transformation = Transformation::compile_with(
        "%utlx 1.0\n---\ntwice(x => x * 3, $input)",
        &Config::new(20),
        Arc::new(Twice),
    )
    .unwrap();
    assert_eq!(transformation.execute(Udm::Integer(2)).unwrap(), Udm::Integer(18));

    let report = validate_with(
        "%utlx 1.0\n---\n[twice(x => y, 1), count([])]",
        &Config::new(20),
        Arc::new(Twice),
        Some(Udm::Null),
    );
    let kinds: Vec<_> = report.errors().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::UndefinedVariable, ErrorKind::UndefinedVariable]);
}

/// Builtins plus `tick(x)`, which returns `x` and cancels the token on its
/// third call.
struct Tripwire {
    builtins: Builtins,
    token: CancellationToken,
    ticks: AtomicUsize,
}

impl Stdlib for Tripwire {
    fn resolve(&self, name: &str) -> Option<FunctionSignature> {
        match name {
            "tick" => Some(FunctionSignature::new("tick").param("x", ParamType::Any)),
            _ => self.builtins.resolve(name),
        }
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<Udm>,
        cx: &mut CallContext<'_, '_>,
    ) -> Result<Udm, StdlibError> {
        if name != "tick" {
            return self.builtins.invoke(name, args, cx);
        }
        if self.ticks.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
            self.token.cancel();
        }
        Ok(args.into_iter().next().unwrap_or(Udm::Null))
    }
}

#[test]
fn test_cancellation_inside_library_iteration() {
    let token = CancellationToken::new();
    let stdlib = Arc::new(Tripwire {
        builtins: Builtins::new(),
        token: token.clone(),
        ticks: AtomicUsize::new(0),
    });
    let transformation = Transformation::compile_with(
        "%utlx 1.0\n---\n$input |> map(x => tick(x) * 2)",
        &Config::new(20),
        stdlib.clone(),
    )
    .unwrap()
    .with_cancellation(token);

    let input = Udm::Array((1..=10).map(Udm::Integer).collect());
    let Err(Error::Evaluation(err)) = transformation.execute(input) else {
        panic!("expected cancellation during map");
    };
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(stdlib.ticks.load(Ordering::SeqCst), 3);
}
