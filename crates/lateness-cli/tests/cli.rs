use assert_cmd::Command;
use predicates::prelude::*;

fn lateness() -> Command {
    Command::cargo_bin("lateness").unwrap()
}

#[test]
fn prints_total_seconds() {
    lateness()
        .args(["2", "days", "3", "hours", "late"])
        .assert()
        .success()
        .stdout("183600\n");
}

#[test]
fn accepts_a_single_quoted_argument() {
    lateness()
        .arg("10 mins late")
        .assert()
        .success()
        .stdout("600\n");
}

#[test]
fn json_output_carries_the_full_result() {
    lateness()
        .args(["--json", "10", "mins", "late"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_seconds\": 600.0"))
        .stdout(predicate::str::contains("\"original\": \"10 mins late\""))
        .stdout(predicate::str::contains("\"minute\""));
}

#[test]
fn rejects_an_unknown_unit() {
    lateness()
        .args(["3", "fortnights", "late"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown time unit"));
}

#[test]
fn rejects_a_missing_late_marker() {
    lateness()
        .args(["2", "days"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing 'late' marker"));
}

#[test]
fn rejects_an_empty_invocation() {
    lateness()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no expression given"));
}
