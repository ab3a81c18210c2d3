//! Binary-level checks that never touch the network.

use assert_cmd::Command;

#[test]
fn help_succeeds() {
    Command::cargo_bin("bdtd-scraper")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn missing_search_term_fails() {
    Command::cargo_bin("bdtd-scraper")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn invalid_workers_value_fails() {
    Command::cargo_bin("bdtd-scraper")
        .unwrap()
        .args(["termo", "-w", "0"])
        .assert()
        .failure();
}
