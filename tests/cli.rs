//! Tests driving the built `bytekv-server` and `bytekv-client` binaries.

use std::net::{TcpListener, TcpStream};
use std::process::Command;
use std::thread;
use std::time::Duration;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

#[test]
fn client_prints_its_version() {
    Command::cargo_bin("bytekv-client")
        .unwrap()
        .arg("-V")
        .assert()
        .success()
        .stdout(contains("bytekv-client"));
}

#[test]
fn server_prints_its_version() {
    Command::cargo_bin("bytekv-server")
        .unwrap()
        .arg("-V")
        .assert()
        .success()
        .stdout(contains("bytekv-server"));
}

#[test]
fn client_rejects_an_unknown_subcommand() {
    Command::cargo_bin("bytekv-client")
        .unwrap()
        .args(&["frobnicate", "key"])
        .assert()
        .failure();
}

#[test]
fn client_without_a_subcommand_fails() {
    Command::cargo_bin("bytekv-client")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn server_rejects_a_bad_addr() {
    Command::cargo_bin("bytekv-server")
        .unwrap()
        .args(&["--addr", "not-an-address"])
        .assert()
        .failure();
}

#[test]
fn client_and_server_binaries_round_trip() {
    let dir = TempDir::new().unwrap();

    // grab a free port for the server
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap().to_string();
    drop(probe);

    let mut server = Command::cargo_bin("bytekv-server")
        .unwrap()
        .args(&["--addr", &addr])
        .args(&["--data-dir", dir.path().to_str().unwrap()])
        .spawn()
        .unwrap();

    // wait for the listener to come up
    let mut up = false;
    for _ in 0..100 {
        if TcpStream::connect(&addr).is_ok() {
            up = true;
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert!(up, "server binary did not come up on {}", addr);

    let run_client = |args: &[&str]| {
        let mut full = vec!["--addr", &addr];
        full.extend_from_slice(args);
        Command::cargo_bin("bytekv-client")
            .unwrap()
            .args(&full)
            .assert()
    };

    run_client(&["set", "foo", "bar"]).success();
    run_client(&["get", "foo"]).success().stdout(contains("bar"));
    run_client(&["exists", "foo"]).success().stdout(contains("1"));
    run_client(&["rename", "foo", "baz"]).success();
    run_client(&["get", "baz"]).success().stdout(contains("bar"));
    run_client(&["del", "baz"]).success();
    run_client(&["get", "baz"])
        .success()
        .stdout(contains("Key not found"));
    run_client(&["del", "baz"]).failure();
    run_client(&["ping"]).success().stdout(contains("PONG"));

    server.kill().unwrap();
}
