//! App, database and upload fixtures

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use comprank_ai::models::RawTable;
use comprank_ai::services::{read_table_bytes, ChatBackend, SimilarityRater};
use comprank_ai::{build_router, AppState};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Create a file-backed job database in a temporary folder
///
/// The TempDir must be kept alive for the duration of the test.
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = comprank_ai::db::init_database_pool(&temp_dir.path().join("test_comprank.db"))
        .await
        .expect("Failed to create test database");
    (temp_dir, pool)
}

/// Rater without retry backoff
pub fn test_rater(backend: Arc<dyn ChatBackend>) -> SimilarityRater {
    SimilarityRater::new(backend, "test-model").with_retry_backoff(Duration::ZERO)
}

/// Router plus the state behind it
pub async fn create_test_app(
    backend: Arc<dyn ChatBackend>,
    password_sha256: Option<String>,
) -> (Router, AppState, TempDir) {
    let (temp_dir, pool) = create_test_db().await;
    let state = AppState::new(pool, test_rater(backend)).with_password_sha256(password_sha256);
    (build_router(state.clone()), state, temp_dir)
}

/// Deal export as produced by the platform: six metadata rows, the header,
/// one row per `(company, description)`, then two footer rows
pub fn sample_upload(rows: &[(&str, &str)]) -> String {
    let mut csv = String::from(
        "Deal Multiple Export\n\
         Generated,2024-03-01\n\
         Filters,Sector: Software\n\
         Currency,USD\n\
         Source,Deal Platform\n\
         Rows,all\n\
         Deal ID,Company,Description,Country\n",
    );
    for (i, (company, description)) in rows.iter().enumerate() {
        csv.push_str(&format!("D-{},{},\"{}\",US\n", 100 + i, company, description));
    }
    csv.push_str("Total,,,\nConfidential,,,\n");
    csv
}

/// Same layout as [`sample_upload`], as an .xlsx workbook
pub fn sample_workbook(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (row, line) in sample_upload(rows).lines().enumerate() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        for (col, cell) in record.iter().enumerate() {
            sheet.write_string(row as u32, col as u16, cell).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub fn sample_table(rows: &[(&str, &str)]) -> RawTable {
    read_table_bytes(sample_upload(rows).as_bytes()).expect("sample upload parses")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request failed")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).expect("response is JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).expect("response is UTF-8")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

pub fn post_bytes(uri: &str, bytes: Vec<u8>, content_type: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(bytes))
        .unwrap()
}

pub fn post_csv(uri: &str, csv: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/csv")
        .body(Body::from(csv))
        .unwrap()
}
