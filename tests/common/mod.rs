//! Common test utilities for oh-no-again integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use oh_no_again::{BatchConfig, RetryConfig};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Retry settings short enough to keep the suite fast
pub fn fast_retry(retries: u32) -> RetryConfig {
    RetryConfig {
        retries,
        delay: Duration::from_millis(10),
        timeout: Duration::from_millis(500),
        jitter: false,
    }
}

/// Metadata-mode batch config on top of [`fast_retry`]
pub fn meta_config(retries: u32) -> BatchConfig {
    BatchConfig {
        retry: fast_retry(retries),
        fail_fast: false,
        return_meta: true,
    }
}

/// JSON body served for `/users/{id}`
pub fn user_body(id: u32) -> Value {
    json!({ "id": id, "name": format!("user-{id}") })
}

/// Mount a 200 JSON response for each of `ids` under `/users/{id}`
pub async fn mount_users(server: &MockServer, ids: &[u32]) {
    for &id in ids {
        Mock::given(method("GET"))
            .and(path(format!("/users/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_body(id)))
            .mount(server)
            .await;
    }
}

/// Paths of every request the server has seen
pub async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

/// Write `items` as a JSON input file inside a fresh temp dir
pub fn write_input(items: &Value) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("items.json");
    std::fs::write(&file, serde_json::to_vec(items).unwrap()).unwrap();
    (dir, file)
}
