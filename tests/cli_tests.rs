//! Binary-level checks of the `vrlg` command line.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn vrlg() -> Command {
    Command::cargo_bin("vrlg").unwrap()
}

#[test]
fn check_accepts_valid_config() {
    let file = config_file("[symbol]\nname = \"BTCUSD-PERP\"\n\n[signal]\nz = 0.2\n");
    vrlg()
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("BTCUSD-PERP"))
        .stdout(predicate::str::contains("Mode: paper"));
}

#[test]
fn check_reports_invalid_field() {
    let file = config_file("[symbol]\ntick_size = -1.0\n");
    vrlg()
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_size"));
}

#[test]
fn check_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    vrlg()
        .args(["check", "--config"])
        .arg(dir.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn live_mode_is_refused() {
    let file = config_file("paper = true\n");
    vrlg()
        .args(["run", "--live", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("paper"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    vrlg().arg("trade").assert().failure().code(2);
}
