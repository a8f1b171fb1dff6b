//! End-to-end pipeline tests against a mock catalog
//!
//! Covers both ingestion modes: per-resource skip behavior and ordering in
//! streaming mode, union combination and fatal validation in batch mode,
//! and the fatal catalog paths shared by both.

use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ldp_ingest::{loan_smoke_contract, IngestError, IngestionPipeline, PipelineConfig};

const DATASET_ID: &str = "loan-dataset";
const LOAN_HEADER: &str = "GrossApproval,TermInMonths,LoanStatus";

fn pipeline_for(server: &MockServer) -> IngestionPipeline {
    let config = PipelineConfig {
        api_base_url: server.uri(),
        dataset_id: DATASET_ID.to_string(),
        max_concurrent_requests: 3,
        sample_rows: 1000,
        sample_seed: 42,
    };
    IngestionPipeline::new(reqwest::Client::new(), loan_smoke_contract(), config)
}

fn output_in(dir: &TempDir) -> PathBuf {
    dir.path().join("loans.csv")
}

fn catalog_body(entries: &[(&str, &str)]) -> serde_json::Value {
    let resources: Vec<serde_json::Value> = entries
        .iter()
        .map(|(format, url)| serde_json::json!({"format": format, "url": url}))
        .collect();
    serde_json::json!({"success": true, "result": {"resources": resources}})
}

async fn mount_catalog(server: &MockServer, entries: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/package_show"))
        .and(query_param("id", DATASET_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body(entries)))
        .mount(server)
        .await;
}

async fn mount_csv(server: &MockServer, file_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn loan_csv(rows: &[&str]) -> String {
    format!("{}\n{}\n", LOAN_HEADER, rows.join("\n"))
}

#[tokio::test]
async fn test_streaming_commits_resources_in_catalog_order() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(
        &server,
        &[
            ("CSV", urls[0].as_str()),
            ("CSV", urls[1].as_str()),
            ("CSV", urls[2].as_str()),
        ],
    )
    .await;
    mount_csv(&server, "/files/a.csv", loan_csv(&["10000.0,120,PIF"])).await;
    mount_csv(&server, "/files/b.csv", loan_csv(&["20000.0,84,CHGOFF"])).await;
    mount_csv(&server, "/files/c.csv", loan_csv(&["30000.0,240,PIF"])).await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = pipeline_for(&server).stream_to_csv(&output).await.unwrap();

    assert_eq!(report.committed, 3);
    assert_eq!(report.rows_committed, 3);
    assert!(report.skipped.is_empty());

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "GrossApproval,TermInMonths,LoanStatus\n\
         10000.0,120,PIF\n\
         20000.0,84,CHGOFF\n\
         30000.0,240,PIF\n"
    );
}

#[tokio::test]
async fn test_streaming_skips_failed_and_invalid_resources() {
    // a downloads and validates; b is missing upstream; c carries a
    // non-positive approval amount. Only a's rows may land in the output.
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(
        &server,
        &[
            ("CSV", urls[0].as_str()),
            ("CSV", urls[1].as_str()),
            ("CSV", urls[2].as_str()),
        ],
    )
    .await;
    mount_csv(&server, "/files/a.csv", loan_csv(&["10000.0,120,PIF"])).await;
    Mock::given(method("GET"))
        .and(path("/files/b.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_csv(&server, "/files/c.csv", loan_csv(&["-5,120,PIF"])).await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = pipeline_for(&server).stream_to_csv(&output).await.unwrap();

    assert_eq!(report.committed, 1);
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped[0].reason.contains("download"));
    assert!(report.skipped[1].reason.contains("validation"));

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "GrossApproval,TermInMonths,LoanStatus\n10000.0,120,PIF\n"
    );
}

#[tokio::test]
async fn test_streaming_fails_when_no_resource_matches_format() {
    let server = MockServer::start().await;
    let pdf_url = format!("{}/files/report.pdf", server.uri());
    mount_catalog(&server, &[("PDF", pdf_url.as_str())]).await;

    // The lone non-CSV resource must never be requested
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let err = pipeline_for(&server)
        .stream_to_csv(&output)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::EmptyCatalog(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_catalog_failure_envelope_is_fatal_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/package_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let err = pipeline_for(&server)
        .stream_to_csv(&output)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Catalog(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_catalog_http_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/package_show"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = pipeline_for(&server)
        .stream_to_csv(&output_in(&TempDir::new().unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Catalog(_)));
}

#[tokio::test]
async fn test_streaming_empty_run_is_fatal() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(&server, &[("CSV", urls[0].as_str()), ("CSV", urls[1].as_str())]).await;
    Mock::given(method("GET"))
        .and(path("/files/a.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.csv"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let err = pipeline_for(&server)
        .stream_to_csv(&output)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::EmptyResult));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_streaming_skips_resources_with_mismatched_header() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(&server, &[("CSV", urls[0].as_str()), ("CSV", urls[1].as_str())]).await;
    mount_csv(
        &server,
        "/files/a.csv",
        "GrossApproval,TermInMonths\n10000.0,120\n".to_string(),
    )
    .await;
    // Valid on its own, but shaped differently from the established header
    mount_csv(&server, "/files/b.csv", loan_csv(&["20000.0,84,PIF"])).await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = pipeline_for(&server).stream_to_csv(&output).await.unwrap();

    assert_eq!(report.committed, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("header"));

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "GrossApproval,TermInMonths\n10000.0,120\n");
}

#[tokio::test]
async fn test_batch_combines_partial_column_files() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["early", "late"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(&server, &[("CSV", urls[0].as_str()), ("CSV", urls[1].as_str())]).await;
    // An older extract without the status column, then a newer one with it
    mount_csv(
        &server,
        "/files/early.csv",
        "GrossApproval,TermInMonths\n10000.0,120\n".to_string(),
    )
    .await;
    mount_csv(&server, "/files/late.csv", loan_csv(&["20000.0,84,CHGOFF"])).await;

    let combined = pipeline_for(&server).combine().await.unwrap();

    assert_eq!(combined.report.committed, 2);
    assert_eq!(combined.table.n_rows(), 2);
    assert_eq!(
        combined.table.columns(),
        ["GrossApproval", "TermInMonths", "LoanStatus"]
    );
    // The older file's rows carry nulls for the column it never had
    assert_eq!(combined.table.cell(0, 2), "");
    assert_eq!(combined.table.cell(1, 2), "CHGOFF");
}

#[tokio::test]
async fn test_batch_validation_failure_is_fatal() {
    let server = MockServer::start().await;
    let url = format!("{}/files/bad.csv", server.uri());
    mount_catalog(&server, &[("CSV", url.as_str())]).await;
    mount_csv(&server, "/files/bad.csv", loan_csv(&["10000.0,120,BOGUS"])).await;

    let err = pipeline_for(&server).combine().await.unwrap_err();
    match err {
        IngestError::Validation(errors) => assert!(errors.has_check("isin")),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_tolerates_partial_fetch_failures() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(&server, &[("CSV", urls[0].as_str()), ("CSV", urls[1].as_str())]).await;
    mount_csv(&server, "/files/a.csv", loan_csv(&["10000.0,120,PIF"])).await;
    Mock::given(method("GET"))
        .and(path("/files/b.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let combined = pipeline_for(&server).combine().await.unwrap();
    assert_eq!(combined.report.committed, 1);
    assert_eq!(combined.report.skipped.len(), 1);
    assert_eq!(combined.table.n_rows(), 1);
}

#[tokio::test]
async fn test_batch_fails_when_every_fetch_fails() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["a", "b"]
        .iter()
        .map(|n| format!("{}/files/{}.csv", server.uri(), n))
        .collect();
    mount_catalog(&server, &[("CSV", urls[0].as_str()), ("CSV", urls[1].as_str())]).await;
    Mock::given(method("GET"))
        .and(path("/files/a.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = pipeline_for(&server).combine().await.unwrap_err();
    assert!(matches!(err, IngestError::AllFetchesFailed { attempted: 2 }));
}
