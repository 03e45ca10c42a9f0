use utlx_core::ast::{ExprKind, ObjectEntry};
use utlx_core::diagnostics::{ErrorKind, Section};
use utlx_core::{Config, Limits, ParseOutcome, parse};

const THREE_BAD_PROPERTIES: &str = "%utlx 1.0\n---\n{ a: 1, b: , c: 2, d 3, e: 4, : 5, f: 6 }";

fn errors(source: &str) -> Vec<String> {
    parse(source, &Config::new(20))
        .errors()
        .map(|e| e.message.clone())
        .collect()
}

#[test]
fn test_malformed_properties_are_collected() {
    let outcome = parse(THREE_BAD_PROPERTIES, &Config::new(20));
    let ParseOutcome::Partial {
        program,
        diagnostics,
    } = outcome
    else {
        panic!("expected a partial program");
    };
    assert_eq!(diagnostics.len(), 3);
    assert!(diagnostics.iter().all(|d| d.section == Section::Content));

    let ExprKind::Object(entries) = &program.content.kind else {
        panic!("the literal must survive");
    };
    let keys: Vec<_> = entries
        .iter()
        .filter_map(|e| match e {
            ObjectEntry::Property { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec!["a", "b", "c", "d", "e", "f"]);
}

#[test]
fn test_error_ceiling_aborts_with_one_marker() {
    let outcome = parse(THREE_BAD_PROPERTIES, &Config::new(2));
    let ParseOutcome::Aborted { diagnostics } = outcome else {
        panic!("expected the parse to abort");
    };
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics[2].kind, ErrorKind::TooManyErrors);
    assert_eq!(
        diagnostics
            .iter()
            .filter(|d| d.kind == ErrorKind::TooManyErrors)
            .count(),
        1
    );
}

#[test]
fn test_fail_fast_stops_at_first_error() {
    for config in [
        Config::new(20).fail_fast(true),
        Config::new(20).enable_recovery(false),
    ] {
        let outcome = parse(THREE_BAD_PROPERTIES, &config);
        let ParseOutcome::Aborted { diagnostics } = outcome else {
            panic!("expected the parse to abort");
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::Parse);
    }
}

#[test]
fn test_unclosed_brackets() {
    assert_eq!(errors("%utlx 1.0\n---\n[1, 2").len(), 1);
    assert_eq!(errors("%utlx 1.0\n---\nf(1, 2").len(), 1);
    assert_eq!(errors("%utlx 1.0\n---\n{ a: [1, 2 }").len(), 1);
    assert_eq!(errors("%utlx 1.0\n---\n$input[0").len(), 1);
}

#[test]
fn test_missing_commas() {
    let found = errors("%utlx 1.0\n---\n[1 2 3]");
    assert_eq!(found.len(), 1);
    assert!(found[0].starts_with("expected ',' or ']'"));
}

#[test]
fn test_lex_errors_are_not_reported_again() {
    let found = errors("%utlx 1.0\n---\n{ a: #, b: 2 }");
    assert_eq!(found, vec!["unexpected character '#'".to_string()]);
}

#[test]
fn test_errors_in_sibling_arguments() {
    let found = errors("%utlx 1.0\n---\nf(1 +, [,], g(*))");
    assert_eq!(found.len(), 3);
}

#[test]
fn test_recovery_resumes_at_let() {
    let found = errors("%utlx 1.0\n---\n{ a: 1 2 let b = 3, c: b }");
    assert_eq!(found.len(), 1);
}

#[test]
fn test_nesting_limit() {
    let config = Config::new(20).limits(Limits {
        max_depth: 10,
        max_steps: None,
    });
    let source = format!("%utlx 1.0\n---\n{}1{}", "(".repeat(12), ")".repeat(12));
    let ParseOutcome::Aborted { diagnostics } = parse(&source, &config) else {
        panic!("expected the parse to abort");
    };
    assert_eq!(diagnostics.last().unwrap().kind, ErrorKind::ResourceExhausted);
}

#[test]
fn test_long_operator_chains_hit_the_nesting_limit() {
    for operator in [" ** ", " |> ", " + ", " && "] {
        let source = format!("%utlx 1.0\n---\n{}", vec!["1"; 50_000].join(operator));
        let ParseOutcome::Aborted { diagnostics } = parse(&source, &Config::new(20)) else {
            panic!("expected the '{}' chain to abort", operator.trim());
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::ResourceExhausted);
    }
}

#[test]
fn test_long_postfix_chains_hit_the_nesting_limit() {
    for link in [".a", "?.a", "[0]", "()"] {
        let source = format!("%utlx 1.0\n---\n$input{}", link.repeat(50_000));
        let ParseOutcome::Aborted { diagnostics } = parse(&source, &Config::new(20)) else {
            panic!("expected the '{}' chain to abort", link);
        };
        assert_eq!(diagnostics.last().unwrap().kind, ErrorKind::ResourceExhausted);
    }
}

#[test]
fn test_chains_within_the_limit_still_parse() {
    let config = Config::new(20);
    for operator in [" ** ", " |> ", " - "] {
        let source = format!("%utlx 1.0\n---\n{}", vec!["x"; 100].join(operator));
        assert!(parse(&source, &config).is_success(), "'{}' chain", operator.trim());
    }
}
