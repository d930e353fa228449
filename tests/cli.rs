//! End-to-end runs of the `oha` binary

mod common;

use std::process::Output;

use common::*;
use serde_json::{Value, json};
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn oha(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oha"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[tokio::test]
async fn test_cli_prints_metadata_records() {
    let server = MockServer::start().await;
    mount_users(&server, &[1, 2]).await;

    let (_dir, input) = write_input(&json!([{ "id": 1 }, { "id": 2 }]));
    let url = format!("{}/users/{{{{id}}}}", server.uri());

    let output = oha(&["-i", input.to_str().unwrap(), "-u", &url, "-c", "2", "-d", "10"]).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let records = stdout_json(&output);
    assert_eq!(
        records,
        json!([
            { "item": { "id": 1 }, "result": user_body(1), "status": 200, "success": true },
            { "item": { "id": 2 }, "result": user_body(2), "status": 200, "success": true },
        ])
    );
}

#[tokio::test]
async fn test_cli_raw_mode_prints_bodies_and_nulls() {
    let server = MockServer::start().await;
    mount_users(&server, &[1]).await;
    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (_dir, input) = write_input(&json!([{ "id": 1 }, { "id": 2 }]));
    let url = format!("{}/users/{{{{id}}}}", server.uri());

    let output = oha(&[
        "-i",
        input.to_str().unwrap(),
        "-u",
        &url,
        "-r",
        "1",
        "--raw",
    ])
    .await;

    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!([user_body(1), null]));
}

#[tokio::test]
async fn test_cli_meta_flags_last_one_wins() {
    let server = MockServer::start().await;
    mount_users(&server, &[1]).await;

    let (_dir, input) = write_input(&json!([{ "id": 1 }]));
    let input = input.to_str().unwrap();
    let url = format!("{}/users/{{{{id}}}}", server.uri());

    let raw = oha(&["-i", input, "-u", &url, "-m", "--no-meta"]).await;
    assert!(raw.status.success());
    assert_eq!(stdout_json(&raw), json!([user_body(1)]));

    let meta = oha(&["-i", input, "-u", &url, "--no-meta", "-m"]).await;
    assert!(meta.status.success());
    assert_eq!(stdout_json(&meta)[0]["success"], json!(true));
    assert_eq!(stdout_json(&meta)[0]["item"], json!({ "id": 1 }));
}

#[tokio::test]
async fn test_cli_fail_fast_exits_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let (_dir, input) = write_input(&json!([{ "id": 1 }]));
    let url = format!("{}/users/{{{{id}}}}", server.uri());

    let output = oha(&["-i", input.to_str().unwrap(), "-u", &url, "-r", "1", "-f"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("502"), "stderr: {stderr}");
}

#[tokio::test]
async fn test_cli_rejects_missing_input_file() {
    let output = oha(&["-i", "/nonexistent/items.json", "-u", "http://127.0.0.1/{{id}}"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read input file"), "stderr: {stderr}");
}

#[tokio::test]
async fn test_cli_rejects_non_array_input() {
    let (_dir, input) = write_input(&json!({ "id": 1 }));

    let output = oha(&["-i", input.to_str().unwrap(), "-u", "http://127.0.0.1/{{id}}"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must contain a JSON array"), "stderr: {stderr}");
}

#[tokio::test]
async fn test_cli_rejects_zero_concurrency() {
    let (_dir, input) = write_input(&json!([{ "id": 1 }]));

    let output = oha(&[
        "-i",
        input.to_str().unwrap(),
        "-u",
        "http://127.0.0.1/{{id}}",
        "-c",
        "0",
    ])
    .await;

    assert!(!output.status.success());
}
