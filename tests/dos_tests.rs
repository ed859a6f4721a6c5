//! `DoS` Prevention Tests
//!
//! Oversized inputs must be rejected with an error rather than exhausting
//! memory or CPU.

use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use feeder_solver::matching::resolver::AssociationConfig;
use feeder_solver::parsing::positions::parse_positions_text;
use feeder_solver::parsing::stations::parse_stations_text;
use feeder_solver::parsing::ParseError;
use feeder_solver::utils::validation::{MAX_PARTS, MAX_STATIONS};
use feeder_solver::web::server::{
    api_router, AppState, MAX_CLASSIFY_MARKINGS, MAX_FILE_FIELD_SIZE, MAX_MULTIPART_FIELDS,
    MAX_TEXT_FIELD_SIZE,
};

fn positions_with_rows(rows: usize) -> String {
    let mut text = String::from("Ref,Val,PosX,PosY,Rot\n");
    for i in 0..rows {
        let _ = writeln!(text, "R{i},10k,0,0,0");
    }
    text
}

#[test]
fn test_limits_are_configured() {
    assert_eq!(MAX_MULTIPART_FIELDS, 10);
    assert_eq!(MAX_FILE_FIELD_SIZE, 16 * 1024 * 1024);
    assert_eq!(MAX_TEXT_FIELD_SIZE, 1024 * 1024);
    assert!(MAX_PARTS >= 10_000);
    assert!(MAX_STATIONS >= 1_000);
}

/// A position file at the limit loads; one more part is refused
#[test]
fn test_part_count_limit() {
    let parts = parse_positions_text(&positions_with_rows(MAX_PARTS)).unwrap();
    assert_eq!(parts.len(), MAX_PARTS);

    let result = parse_positions_text(&positions_with_rows(MAX_PARTS + 1));
    assert!(matches!(result, Err(ParseError::TooManyRecords(n)) if n == MAX_PARTS));
}

#[test]
fn test_station_count_limit() {
    let mut text = String::from("ID,Note\n");
    for i in 0..=MAX_STATIONS {
        let _ = writeln!(text, "{i},10k");
    }

    let result = parse_stations_text(&text);
    assert!(matches!(result, Err(ParseError::TooManyRecords(_))));
}

/// Association over a large board stays well inside the request timeout
#[test]
fn test_large_board_association_time() {
    use feeder_solver::{AssociationEngine, StationRecord};

    let parts = parse_positions_text(&positions_with_rows(20_000)).unwrap();
    let stations: Vec<StationRecord> = (0..500)
        .map(|i| StationRecord::new(i.to_string(), format!("{i}k")))
        .collect();

    let config = AssociationConfig::load_embedded().unwrap();
    let start = Instant::now();
    let mut engine = AssociationEngine::from_records(parts, stations, &config);
    let report = engine.auto_associate_all();

    assert_eq!(report.matched, 20_000);
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test]
async fn test_classify_batch_limit() {
    let config = AssociationConfig::load_embedded().unwrap();
    let app = api_router(Arc::new(AppState { config }));

    let markings = vec!["10k"; MAX_CLASSIFY_MARKINGS + 1];
    let body = serde_json::json!({ "markings": markings }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_type"], "too_many_markings");
}

#[tokio::test]
async fn test_malformed_multipart_is_rejected() {
    let config = AssociationConfig::load_embedded().unwrap();
    let app = api_router(Arc::new(AppState { config }));

    let request = Request::builder()
        .method("POST")
        .uri("/api/associate")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=xyz")
        .body(Body::from("--xyz\r\nContent-Disposition: form-data; name=\"positions\"\r\n\r\nRef,Val"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}
