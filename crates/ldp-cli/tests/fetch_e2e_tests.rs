//! End-to-end tests for the ldp binary
//!
//! These drive the real binary against a mock catalog server and validate:
//! - The consolidated output of a streaming fetch
//! - `--skip` short-circuiting without any network traffic
//! - Non-zero exit on fatal catalog conditions
//! - Combined-mode CSV output

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATASET_ID: &str = "loan-dataset";

fn catalog_body(urls: &[String]) -> serde_json::Value {
    let resources: Vec<serde_json::Value> = urls
        .iter()
        .map(|u| serde_json::json!({"format": "CSV", "url": u}))
        .collect();
    serde_json::json!({"success": true, "result": {"resources": resources}})
}

async fn mount_catalog(server: &MockServer, urls: &[String]) {
    Mock::given(method("GET"))
        .and(path("/package_show"))
        .and(query_param("id", DATASET_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body(urls)))
        .mount(server)
        .await;
}

async fn mount_csv(server: &MockServer, file_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn ldp() -> Command {
    Command::cargo_bin("ldp").unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_writes_consolidated_output() {
    let server = MockServer::start().await;
    let urls = vec![
        format!("{}/files/a.csv", server.uri()),
        format!("{}/files/b.csv", server.uri()),
    ];
    mount_catalog(&server, &urls).await;
    mount_csv(
        &server,
        "/files/a.csv",
        "GrossApproval,TermInMonths,LoanStatus\n10000.0,120,PIF\n",
    )
    .await;
    mount_csv(
        &server,
        "/files/b.csv",
        "GrossApproval,TermInMonths,LoanStatus\n20000.0,84,CHGOFF\n",
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("loans.csv");

    ldp()
        .arg("fetch")
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.uri())
        .arg("--dataset")
        .arg(DATASET_ID)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "GrossApproval,TermInMonths,LoanStatus\n\
         10000.0,120,PIF\n\
         20000.0,84,CHGOFF\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_skip_short_circuits_without_network_calls() {
    let server = MockServer::start().await;

    // Any request at all would fail this expectation when the server drops
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("loans.csv");
    std::fs::write(&output, "GrossApproval\n10000.0\n").unwrap();

    ldp()
        .arg("fetch")
        .arg("--skip")
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.uri())
        .arg("--dataset")
        .arg(DATASET_ID)
        .assert()
        .success();

    // Existing artifact is untouched
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "GrossApproval\n10000.0\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_fails_on_catalog_failure_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/package_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("loans.csv");

    ldp()
        .arg("fetch")
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.uri())
        .arg("--dataset")
        .arg(DATASET_ID)
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog"));

    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_fails_when_nothing_commits() {
    let server = MockServer::start().await;
    let urls = vec![format!("{}/files/gone.csv", server.uri())];
    mount_catalog(&server, &urls).await;
    Mock::given(method("GET"))
        .and(path("/files/gone.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("loans.csv");

    ldp()
        .arg("fetch")
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.uri())
        .arg("--dataset")
        .arg(DATASET_ID)
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_combine_writes_united_csv() {
    let server = MockServer::start().await;
    let urls = vec![
        format!("{}/files/early.csv", server.uri()),
        format!("{}/files/late.csv", server.uri()),
    ];
    mount_catalog(&server, &urls).await;
    mount_csv(
        &server,
        "/files/early.csv",
        "GrossApproval,TermInMonths\n10000.0,120\n",
    )
    .await;
    mount_csv(
        &server,
        "/files/late.csv",
        "GrossApproval,TermInMonths,LoanStatus\n20000.0,84,CHGOFF\n",
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("combined.csv");

    ldp()
        .arg("combine")
        .arg("--output")
        .arg(&output)
        .arg("--base-url")
        .arg(server.uri())
        .arg("--dataset")
        .arg(DATASET_ID)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "GrossApproval,TermInMonths,LoanStatus\n\
         10000.0,120,\n\
         20000.0,84,CHGOFF\n"
    );
}
