/// Integration tests with a mocked telemetry API
/// Tests the search-console client behavior without hitting a real service
use chrono::NaiveDate;
use search_opportunity_api::config::Config;
use search_opportunity_api::errors::AppError;
use search_opportunity_api::search_console::SearchConsoleService;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(search_api_base_url: String) -> Config {
    Config {
        port: 8080,
        search_api_base_url,
        search_api_token: "test_token".to_string(),
        site_url: "example.com".to_string(),
        brand_terms: vec!["acme".to_string()],
        metrics_data_dir: "keyword_metrics_data".to_string(),
        exclusions_path: "deleted_keywords.txt".to_string(),
        days_back: 90,
        row_limit: 25_000,
        min_impressions: 10,
        max_position: 100.0,
        min_query_length: 3,
        analysis_cache_ttl_secs: 900,
    }
}

fn window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2026, 7, 30).expect("valid date"),
    )
}

const QUERY_PATH: &str = "/webmasters/v3/sites/example.com/searchAnalytics/query";

#[tokio::test]
async fn successful_response_parses_rows() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "rows": [
            {"keys": ["how to teach math"], "clicks": 40, "impressions": 500, "ctr": 0.08, "position": 4.2},
            {"keys": ["best tutor"], "clicks": 10.0, "impressions": 200.0, "ctr": 0.05, "position": 2.0}
        ],
        "responseAggregationType": "byProperty"
    });

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(header("authorization", "Bearer test_token"))
        .and(body_partial_json(serde_json::json!({
            "startDate": "2026-05-01",
            "endDate": "2026-07-30",
            "dimensions": ["query"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = SearchConsoleService::new(&config);
    let (start, end) = window();

    let records = service
        .fetch_query_rows("example.com", start, end, 25_000)
        .await
        .expect("fetch succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].query, "how to teach math");
    assert_eq!(records[0].clicks, 40);
    assert_eq!(records[0].impressions, 500);
    assert_eq!(records[0].position, 4.2);
    assert_eq!(records[1].query, "best tutor");
}

#[tokio::test]
async fn missing_rows_is_the_valid_empty_case() {
    let mock_server = MockServer::start().await;

    // No data in the window: the API omits "rows" entirely
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"responseAggregationType": "byProperty"})),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = SearchConsoleService::new(&config);
    let (start, end) = window();

    let records = service
        .fetch_query_rows("example.com", start, end, 25_000)
        .await
        .expect("empty window is not an error");
    assert!(records.is_empty());
}

#[tokio::test]
async fn server_error_surfaces_as_telemetry_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = SearchConsoleService::new(&config);
    let (start, end) = window();

    let result = service
        .fetch_query_rows("example.com", start, end, 25_000)
        .await;

    match result {
        Err(AppError::TelemetrySource(msg)) => {
            assert!(msg.contains("500"), "unexpected message: {msg}");
        }
        other => panic!("expected TelemetrySource error, got {other:?}"),
    }
}

#[tokio::test]
async fn pagination_continues_until_a_short_page() {
    let mock_server = MockServer::start().await;

    let full_page = serde_json::json!({
        "rows": [
            {"keys": ["query one"], "clicks": 1, "impressions": 10, "ctr": 0.1, "position": 3.0},
            {"keys": ["query two"], "clicks": 2, "impressions": 20, "ctr": 0.1, "position": 5.0}
        ]
    });
    let short_page = serde_json::json!({
        "rows": [
            {"keys": ["query three"], "clicks": 3, "impressions": 30, "ctr": 0.1, "position": 7.0}
        ]
    });

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_partial_json(serde_json::json!({"startRow": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&full_page))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_partial_json(serde_json::json!({"startRow": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&short_page))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = SearchConsoleService::new(&config);
    let (start, end) = window();

    let records = service
        .fetch_query_rows("example.com", start, end, 2)
        .await
        .expect("paginated fetch succeeds");

    assert_eq!(records.len(), 3);
    assert_eq!(records[2].query, "query three");
}
