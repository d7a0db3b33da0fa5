use deepmatch as dm;
use deepmatch::{Config, Matcher, Registry, UsageError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn got(v: serde_json::Value) -> Value {
    Value::from(v)
}

#[test]
fn test_document_with_operators() {
    let expected = dm::parse_expected(
        r#"{
            "id": All(Gt(0), Lt(1000)),
            "name": Re("^[A-Z][a-z]+$"),
            "tags": SuperSetOf("admin"),
            "scores": ArrayEach(Between(0, 100)),
            "meta": SuperMapOf({"version": Gte(2)}),
            "deleted_at": Nil(),
            "avatar": Ignore()
        }"#,
    )
    .unwrap();
    let doc = got(json!({
        "id": 42,
        "name": "Alice",
        "tags": ["user", "admin"],
        "scores": [10, 99],
        "meta": {"version": 3, "build": "x"},
        "deleted_at": null,
        "avatar": {"url": "..."}
    }));
    assert!(dm::check(&doc, &expected).is_ok());
}

#[test]
fn test_document_mismatch_points_at_the_notation_line() {
    let expected = dm::parse_expected("{\n  \"n\": 1,\n  \"tags\": Bag(\"a\", \"b\")\n}").unwrap();
    let err = dm::check_with(
        &Config::default().with_max_errors(1),
        &got(json!({"n": 1, "tags": ["a", "c"]})),
        &expected,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "comparing DATA[\"tags\"] as a Bag\n\
         \tMissing items: \"b\"\n\
         \t  Extra items: \"c\"\n\
         [under operator Bag at <expected>:3]"
    );
}

#[test]
fn test_matcher_check_str() {
    let matcher = Matcher::new(Config::default().with_max_errors(-1), Registry::with_builtins());
    let result = matcher
        .check_str(&got(json!([1, "x", 3])), r#"[Gt(0), HasPrefix("y"), Lt(3)]"#)
        .unwrap();
    let err = result.unwrap_err();
    let paths: Vec<_> = err.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, ["DATA[1]", "DATA[2]"]);

    assert!(matches!(
        matcher.check_str(&Value::Nil, "Between(1)"),
        Err(UsageError::Arity { .. })
    ));
}

#[test]
fn test_len_and_contains() {
    let expected = dm::parse_expected(r#"{"items": All(Len(Between(1, 3)), Contains("b"))}"#).unwrap();
    assert!(dm::matches(&got(json!({"items": ["a", "b"]})), &expected));
    assert!(!dm::matches(&got(json!({"items": ["a"]})), &expected));
    assert!(!dm::matches(&got(json!({"items": []})), &expected));
}

#[test]
fn test_unknown_operator() {
    let err = dm::parse_expected("[1, Frob()]").unwrap_err();
    assert_eq!(err.to_string(), "unknown operator Frob()");
}
