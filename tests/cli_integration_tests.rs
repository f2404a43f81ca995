//! End-to-end CLI tests driving the `gfmlint` binary via `assert_cmd`,
//! matching the teacher's `tests/` convention of exercising the compiled
//! binary rather than calling library internals directly.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn gfmlint() -> Command {
    Command::cargo_bin("gfmlint").unwrap()
}

#[test]
fn clean_document_exits_zero_with_no_output() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    writeln!(file, "# Title\n\nA clean paragraph.\n").unwrap();

    gfmlint()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn trailing_whitespace_is_reported_and_exits_one() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    write!(file, "hello   \n").unwrap();

    gfmlint()
        .arg(file.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("MD009"));
}

#[test]
fn disabling_a_rule_suppresses_its_violations() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    write!(file, "hello   \n").unwrap();

    gfmlint()
        .arg(file.path())
        .arg("--disable-rules")
        .arg("MD009")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn set_override_changes_line_length_threshold() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    writeln!(file, "{}", "a".repeat(50)).unwrap();

    gfmlint()
        .arg(file.path())
        .arg("--set")
        .arg("MD013.line_length=$#40")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("MD013"));
}

#[test]
fn missing_file_is_an_io_error_and_exits_two() {
    gfmlint().arg("/no/such/file.md").assert().code(2);
}

#[test]
fn malformed_set_override_without_strict_config_falls_back_to_defaults() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    writeln!(file, "# Title\n").unwrap();

    gfmlint()
        .arg(file.path())
        .arg("--set")
        .arg("not_a_valid_override")
        .assert()
        .success();
}

#[test]
fn malformed_set_override_with_strict_config_aborts() {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    writeln!(file, "# Title\n").unwrap();

    gfmlint()
        .arg(file.path())
        .arg("--set")
        .arg("not_a_valid_override")
        .arg("--strict-config")
        .assert()
        .code(1);
}

#[test]
fn stdin_is_read_when_path_is_a_dash() {
    gfmlint()
        .arg("-")
        .write_stdin("hello   \n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("<stdin>"));
}
