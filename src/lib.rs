//! Search Keyword Opportunity API Library
//!
//! This library ingests keyword-performance telemetry from a search-console
//! style reporting API, enriches it with third-party keyword metrics, and
//! computes prioritized opportunity scores for SEO and answer-engine (AEO/GEO)
//! optimization.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker for the telemetry source.
//! - `classify`: Search-intent, AEO-intent, and SERP-feature classification.
//! - `config`: Configuration management.
//! - `ctr`: Click-through-rate benchmark model.
//! - `errors`: Error handling types.
//! - `exclusions`: Brand-term and deleted-keyword exclusion store.
//! - `export`: CSV serialization of scored opportunities.
//! - `handlers`: HTTP request handlers.
//! - `metrics`: Keyword-metrics dataset store and enrichment fallback.
//! - `models`: Core data models.
//! - `pipeline`: The batch scoring pipeline.
//! - `scoring`: Opportunity and answer-potential scorers.
//! - `search_console`: Telemetry source client.

pub mod circuit_breaker;
pub mod classify;
pub mod config;
pub mod ctr;
pub mod errors;
pub mod exclusions;
pub mod export;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod search_console;
