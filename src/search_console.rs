//! Telemetry source client.
//!
//! Fetches per-query search performance rows from a search-console style
//! reporting API. The service owns a circuit breaker so a failing upstream
//! fails fast instead of being hammered; an open circuit surfaces as a
//! telemetry source error for that run, never as silently substituted data.

use crate::circuit_breaker::{create_telemetry_circuit_breaker, TelemetryCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::RawPerformanceRecord;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Request body for the search analytics query endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    start_date: &'a str,
    end_date: &'a str,
    dimensions: [&'a str; 1],
    row_limit: u32,
    start_row: u32,
}

/// One row of the search analytics response. The API reports counts as JSON
/// numbers that may arrive as floats.
#[derive(Debug, Clone, Deserialize)]
struct QueryResponseRow {
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    clicks: f64,
    #[serde(default)]
    impressions: f64,
    #[serde(default)]
    ctr: f64,
    #[serde(default)]
    position: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct QueryResponse {
    /// Absent entirely when the date range has no data; that is the valid
    /// empty case, not an error.
    #[serde(default)]
    rows: Vec<QueryResponseRow>,
}

impl From<QueryResponseRow> for RawPerformanceRecord {
    fn from(row: QueryResponseRow) -> Self {
        RawPerformanceRecord {
            query: row.keys.into_iter().next().unwrap_or_default(),
            clicks: row.clicks.round() as i64,
            impressions: row.impressions.round() as i64,
            ctr: row.ctr,
            position: row.position,
        }
    }
}

pub struct SearchConsoleService {
    client: Client,
    base_url: String,
    api_token: String,
    breaker: TelemetryCircuitBreaker,
}

impl SearchConsoleService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.search_api_base_url.clone(),
            api_token: config.search_api_token.clone(),
            breaker: create_telemetry_circuit_breaker(),
        }
    }

    /// Fetch every per-query performance row for a site over a date range.
    ///
    /// Pages through the API `row_limit` rows at a time until a short page.
    /// Returns an empty vector when the range has no data.
    pub async fn fetch_query_rows(
        &self,
        site_url: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        row_limit: u32,
    ) -> Result<Vec<RawPerformanceRecord>, AppError> {
        tracing::info!(
            "Fetching search analytics for {} from {} to {}",
            site_url,
            start_date,
            end_date
        );

        let mut records: Vec<RawPerformanceRecord> = Vec::new();
        let mut start_row = 0u32;
        loop {
            let page = {
                use failsafe::futures::CircuitBreaker;
                self.breaker
                    .call(self.fetch_page(site_url, start_date, end_date, row_limit, start_row))
                    .await
                    .map_err(|e| match e {
                        failsafe::Error::Inner(inner) => inner,
                        failsafe::Error::Rejected => AppError::TelemetrySource(
                            "circuit open: telemetry source failing, retry later".to_string(),
                        ),
                    })?
            };

            let fetched = page.len();
            records.extend(page.into_iter().map(RawPerformanceRecord::from));

            if fetched < row_limit as usize {
                break;
            }
            start_row += fetched as u32;
        }

        tracing::info!("Retrieved {} keyword row(s) from the telemetry source", records.len());
        Ok(records)
    }

    async fn fetch_page(
        &self,
        site_url: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        row_limit: u32,
        start_row: u32,
    ) -> Result<Vec<QueryResponseRow>, AppError> {
        // Build URL through the parser so the site identifier is escaped as
        // a single path segment
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| AppError::TelemetrySource(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::TelemetrySource("Base URL cannot have paths".to_string()))?
            .extend(["webmasters", "v3", "sites", site_url, "searchAnalytics", "query"]);

        let start = start_date.format("%Y-%m-%d").to_string();
        let end = end_date.format("%Y-%m-%d").to_string();
        let body = QueryRequest {
            start_date: &start,
            end_date: &end,
            dimensions: ["query"],
            row_limit,
            start_row,
        };

        tracing::debug!(
            "POST {} (rows {}..{})",
            url.path(),
            start_row,
            start_row + row_limit
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::TelemetrySource(format!("Telemetry request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Telemetry source returned error {}: {}", status, error_text);
            return Err(AppError::TelemetrySource(format!(
                "Telemetry source returned status {}: {}",
                status, error_text
            )));
        }

        let result: QueryResponse = response.json().await.map_err(|e| {
            AppError::TelemetrySource(format!("Failed to parse telemetry response: {}", e))
        })?;

        Ok(result.rows)
    }
}
