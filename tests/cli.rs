use std::process::{Command, Output};

fn dmatch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dmatch"))
        .args(args)
        .env_remove("DEEPMATCH_MAX_ERRORS")
        .output()
        .expect("failed to run dmatch")
}

#[test]
fn test_match_exits_zero() {
    let out = dmatch(&[r#"{"a": [3, 1, 2]}"#, r#"{"a": Bag(1, 2, 3)}"#]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "ok");
}

#[test]
fn test_mismatch_exits_one_with_report() {
    let out = dmatch(&["[1, 2]", "[1, Gt(5)]", "--root", "resp"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("resp[1]: values differ\n\t     got: 2\n\texpected: > 5"), "{stderr}");
}

#[test]
fn test_fatal_flag_marks_the_report() {
    let out = dmatch(&["1", "2", "--fatal"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("FATAL: DATA: values differ"));
}

#[test]
fn test_bad_input_exits_two() {
    assert_eq!(dmatch(&["{", "1"]).status.code(), Some(2));
    assert_eq!(dmatch(&["1", "Nope()"]).status.code(), Some(2));
    assert_eq!(dmatch(&["1", "1", "--config", "{\"max_errors\": \"x\"}"]).status.code(), Some(2));
}

#[test]
fn test_max_errors_from_config() {
    let out = dmatch(&["[1, 2, 3]", "[7, 8, 9]", "--config", r#"{"max_errors": -1}"#]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("values differ").count(), 3);
    assert!(!stderr.contains("Too many errors"));
}
