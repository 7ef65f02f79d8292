use crate::classify::Classifier;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::exclusions::ExclusionStore;
use crate::export;
use crate::metrics::MetricsStore;
use crate::models::*;
use crate::pipeline::{self, AnalysisContext};
use crate::search_console::SearchConsoleService;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the search-console style reporting API.
    pub telemetry: SearchConsoleService,
    /// Compiled classification rules, shared across runs.
    pub classifier: Classifier,
    /// Read-only keyword metrics snapshot, built once at startup.
    pub metrics: Arc<MetricsStore>,
    /// Brand terms + persisted deleted keywords.
    pub exclusions: ExclusionStore,
    /// Completed analysis reports keyed by site and date range. Entries are
    /// immutable snapshots; exclusion edits invalidate the cache instead of
    /// mutating a report.
    pub analysis_cache: Cache<String, Arc<AnalysisReport>>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and the metrics snapshot identity so
/// operators can tell a degraded (heuristics-only) process from an enriched
/// one.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "search-opportunity-api",
            "version": "0.1.0",
            "metrics_keywords": state.metrics.len(),
            "metrics_fingerprint": state.metrics.fingerprint(),
            "degraded_enrichment": state.metrics.is_empty(),
        })),
    )
}

/// Run the analysis for a date window, or serve the cached report for it.
///
/// The cache key is site + resolved date range, so "refresh" is simply a new
/// day (or TTL expiry) producing a new snapshot. A telemetry failure
/// propagates as an error for this run; stale reports are never substituted.
async fn run_analysis(
    state: &Arc<AppState>,
    days_back: Option<i64>,
) -> Result<Arc<AnalysisReport>, AppError> {
    let days_back = days_back.unwrap_or(state.config.days_back);
    if !(1..=540).contains(&days_back) {
        return Err(AppError::BadRequest(
            "days_back must be between 1 and 540".to_string(),
        ));
    }

    let end_date = Utc::now().date_naive();
    let start_date = end_date - Duration::days(days_back);
    let cache_key = format!("{}|{}|{}", state.config.site_url, start_date, end_date);

    if let Some(report) = state.analysis_cache.get(&cache_key).await {
        tracing::debug!("Serving cached analysis for {}", cache_key);
        return Ok(report);
    }

    let raw = state
        .telemetry
        .fetch_query_rows(
            &state.config.site_url,
            start_date,
            end_date,
            state.config.row_limit,
        )
        .await?;

    // Point-in-time exclusion snapshot: applied uniformly to this run, edits
    // during the run are observed on the next one
    let exclusions = state.exclusions.snapshot().await;
    let ctx = AnalysisContext {
        classifier: &state.classifier,
        metrics: &state.metrics,
        exclusions: &exclusions,
        brand_terms: state.exclusions.brand_terms(),
    };
    let outcome = pipeline::analyze(&raw, &ctx);

    // Serving thresholds from configuration, mirroring the classic analysis
    // criteria: top-N positions, minimum impressions, no fragment queries
    let scored = outcome.opportunities.len();
    let opportunities: Vec<ScoredOpportunity> = outcome
        .opportunities
        .into_iter()
        .filter(|row| {
            row.position <= state.config.max_position
                && row.impressions >= state.config.min_impressions.max(0) as u64
                && row.query.chars().count() >= state.config.min_query_length
        })
        .collect();
    let below_thresholds = scored - opportunities.len();

    let summary = pipeline::summarize(&opportunities);
    let report = Arc::new(AnalysisReport {
        run_id: Uuid::new_v4(),
        site_url: state.config.site_url.clone(),
        start_date,
        end_date,
        fetched: outcome.fetched,
        dropped_malformed: outcome.dropped_malformed,
        excluded: outcome.excluded,
        below_thresholds,
        degraded_enrichment: state.metrics.is_empty(),
        metrics_fingerprint: state.metrics.fingerprint().map(str::to_string),
        summary,
        opportunities,
    });

    tracing::info!(
        "Analysis run {}: {} fetched, {} malformed, {} excluded, {} below thresholds, {} scored",
        report.run_id,
        report.fetched,
        report.dropped_malformed,
        report.excluded,
        report.below_thresholds,
        report.opportunities.len()
    );

    state.analysis_cache.insert(cache_key, report.clone()).await;
    Ok(report)
}

fn apply_filters(rows: &[ScoredOpportunity], params: &OpportunityQuery) -> Vec<ScoredOpportunity> {
    let mut filtered: Vec<ScoredOpportunity> = rows
        .iter()
        .filter(|row| params.priority.map_or(true, |p| row.priority == p))
        .filter(|row| {
            params
                .opportunity_type
                .map_or(true, |t| row.opportunity_type == t)
        })
        .filter(|row| params.intent.map_or(true, |i| row.intent == i))
        .filter(|row| {
            params
                .min_impressions
                .map_or(true, |min| row.impressions >= min.max(0) as u64)
        })
        .filter(|row| params.max_position.map_or(true, |max| row.position <= max))
        .filter(|row| params.min_score.map_or(true, |min| row.opportunity_score >= min))
        .cloned()
        .collect();
    if let Some(limit) = params.limit {
        filtered.truncate(limit);
    }
    filtered
}

/// GET /api/v1/opportunities
///
/// Runs (or serves the cached) analysis and returns the scored, sorted
/// opportunities, optionally refined by query-parameter filters.
pub async fn list_opportunities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpportunityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /api/v1/opportunities - params: {:?}", params);

    let report = run_analysis(&state, params.days_back).await?;
    let opportunities = apply_filters(&report.opportunities, &params);

    Ok(Json(json!({
        "run_id": report.run_id,
        "site_url": report.site_url,
        "start_date": report.start_date,
        "end_date": report.end_date,
        "degraded_enrichment": report.degraded_enrichment,
        "total": report.opportunities.len(),
        "returned": opportunities.len(),
        "opportunities": opportunities,
    })))
}

/// GET /api/v1/opportunities/summary
///
/// Returns the run metadata and aggregate counts without the row payload.
pub async fn opportunity_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpportunityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = run_analysis(&state, params.days_back).await?;

    Ok(Json(json!({
        "run_id": report.run_id,
        "site_url": report.site_url,
        "start_date": report.start_date,
        "end_date": report.end_date,
        "fetched": report.fetched,
        "dropped_malformed": report.dropped_malformed,
        "excluded": report.excluded,
        "below_thresholds": report.below_thresholds,
        "degraded_enrichment": report.degraded_enrichment,
        "metrics_fingerprint": report.metrics_fingerprint,
        "summary": report.summary,
    })))
}

/// GET /api/v1/opportunities/aeo
///
/// The same scored rows ranked for answer-engine optimization: sorted by
/// answer potential (ties: impressions desc, position asc).
pub async fn list_answer_opportunities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnswerQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /api/v1/opportunities/aeo - params: {:?}", params);

    let report = run_analysis(&state, params.days_back).await?;

    let mut rows: Vec<ScoredOpportunity> = report
        .opportunities
        .iter()
        .filter(|row| {
            params
                .min_potential
                .map_or(true, |min| row.answer_potential >= min)
        })
        .filter(|row| {
            !params.questions_only.unwrap_or(false) || row.aeo_intent == AeoIntent::QuestionBased
        })
        .filter(|row| {
            params
                .min_impressions
                .map_or(true, |min| row.impressions >= min.max(0) as u64)
        })
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        b.answer_potential
            .total_cmp(&a.answer_potential)
            .then_with(|| b.impressions.cmp(&a.impressions))
            .then_with(|| a.position.total_cmp(&b.position))
    });
    if let Some(limit) = params.limit {
        rows.truncate(limit);
    }

    Ok(Json(json!({
        "run_id": report.run_id,
        "site_url": report.site_url,
        "total": report.opportunities.len(),
        "returned": rows.len(),
        "opportunities": rows,
    })))
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

/// GET /api/v1/opportunities/export
///
/// Full CSV export of the scored opportunities.
pub async fn export_opportunities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpportunityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = run_analysis(&state, params.days_back).await?;
    let rows = apply_filters(&report.opportunities, &params);
    let body = export::opportunities_csv(&rows)?;

    tracing::info!("Exported {} opportunities to CSV", rows.len());
    let filename = format!("keyword_opportunities_{}.csv", report.end_date);
    Ok(csv_response(&filename, body))
}

/// GET /api/v1/opportunities/export/keywords
///
/// Single-column CSV of unique keywords, for hand-off to the metrics vendor.
pub async fn export_keywords(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpportunityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = run_analysis(&state, params.days_back).await?;
    let body = export::keywords_csv(&report.opportunities)?;

    let filename = format!("keywords_for_metrics_{}.csv", report.end_date);
    Ok(csv_response(&filename, body))
}

/// GET /api/v1/exclusions
pub async fn list_exclusions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(json!({
        "brand_terms": state.exclusions.brand_terms(),
        "deleted_keywords": state.exclusions.deleted_keywords().await,
    })))
}

/// POST /api/v1/exclusions
///
/// Adds deleted keywords to the persisted exclusion set and invalidates the
/// analysis cache so the next run reflects the new snapshot.
pub async fn add_exclusions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddExclusionsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.keywords.is_empty() {
        return Err(AppError::BadRequest(
            "At least one keyword required".to_string(),
        ));
    }

    let added = state
        .exclusions
        .add(&request.keywords)
        .await
        .context("Failed to persist deleted keywords")?;
    if added > 0 {
        state.analysis_cache.invalidate_all();
    }

    Ok(Json(json!({
        "added": added,
        "deleted_keywords": state.exclusions.deleted_keywords().await,
    })))
}

/// DELETE /api/v1/exclusions/:keyword
pub async fn remove_exclusion(
    State(state): State<Arc<AppState>>,
    Path(keyword): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = state
        .exclusions
        .remove(&keyword)
        .await
        .context("Failed to persist exclusion removal")?;
    if !removed {
        return Err(AppError::NotFound(format!(
            "'{}' is not in the deleted keyword set",
            keyword.trim().to_lowercase()
        )));
    }
    state.analysis_cache.invalidate_all();

    Ok(Json(json!({
        "removed": keyword.trim().to_lowercase(),
        "deleted_keywords": state.exclusions.deleted_keywords().await,
    })))
}
