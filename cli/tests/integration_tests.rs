//! End-to-end CLI tests: exit codes, stdout/stderr routing.

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn light() -> Command {
    Command::cargo_bin("light").unwrap()
}

#[test]
fn run_hello() {
    light()
        .arg("run")
        .arg(fixture("hello.lt"))
        .assert()
        .success()
        .stdout("hello world\n6\n")
        .stderr("");
}

#[test]
fn run_classes() {
    light()
        .arg("run")
        .arg(fixture("classes.lt"))
        .assert()
        .success()
        .stdout("A:1/2\n");
}

#[test]
fn run_lex_error_exits_nonzero() {
    light()
        .arg("run")
        .arg(fixture("lex_error.lt"))
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("E1003"))
        .stderr(predicate::str::contains("did you mean '&&'?"));
}

#[test]
fn run_parse_error_exits_nonzero() {
    light()
        .arg("run")
        .arg(fixture("parse_error.lt"))
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn run_runtime_error_exits_nonzero() {
    light()
        .arg("run")
        .arg(fixture("runtime_error.lt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot assign to constant"));
}

#[test]
fn run_uncaught_throw() {
    light()
        .arg("run")
        .arg(fixture("throw.lt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("uncaught throw"))
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn run_missing_file() {
    light()
        .arg("run")
        .arg("no-such-file.lt")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read file"));
}

#[test]
fn tokens_text_output() {
    light()
        .arg("tokens")
        .arg(fixture("hello.lt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("IDENT"))
        .stdout(predicate::str::contains("function"))
        .stdout(predicate::str::contains("EOF"));
}

#[test]
fn tokens_json_output() {
    light()
        .arg("tokens")
        .arg(fixture("hello.lt"))
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tokens\""))
        .stdout(predicate::str::contains("\"diagnostics\""))
        .stdout(predicate::str::contains("\"kind\""));
}

#[test]
fn tokens_on_bad_input_exits_nonzero() {
    light()
        .arg("tokens")
        .arg(fixture("lex_error.lt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E1003"));
}

#[test]
fn parse_json_output() {
    light()
        .arg("parse")
        .arg(fixture("hello.lt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ast\""))
        .stdout(predicate::str::contains("\"diagnostics\""));
}

#[test]
fn parse_error_reported_in_json_and_exit_code() {
    light()
        .arg("parse")
        .arg(fixture("parse_error.lt"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("E2001"));
}
