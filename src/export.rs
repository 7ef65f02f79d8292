//! CSV serialization of scored opportunities.
//!
//! Column labels are presentation, but the column set mirrors
//! [`ScoredOpportunity`](crate::models::ScoredOpportunity) field-for-field
//! and numeric values are written unformatted, so an exported file carries
//! the full scored record and round-trips cleanly.

use crate::errors::AppError;
use crate::models::ScoredOpportunity;
use std::collections::HashSet;

const EXPORT_HEADERS: [&str; 19] = [
    "Keyword",
    "Current Position",
    "Monthly Impressions",
    "Monthly Clicks",
    "Current CTR",
    "Expected CTR",
    "CTR Gap",
    "Traffic Potential",
    "Opportunity Score",
    "Opportunity Type",
    "Priority",
    "Answer Potential",
    "Search Intent",
    "AEO Intent",
    "SERP Features",
    "Est. Monthly Volume",
    "Keyword Difficulty",
    "Average CPC",
    "Data Source",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))
}

/// Serialize scored opportunities to CSV, one row per opportunity.
pub fn opportunities_csv(rows: &[ScoredOpportunity]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for row in rows {
        let features = row
            .serp_feature_candidates
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record(vec![
            row.query.clone(),
            row.position.to_string(),
            row.impressions.to_string(),
            row.clicks.to_string(),
            row.ctr.to_string(),
            row.expected_ctr.to_string(),
            row.ctr_gap.to_string(),
            row.traffic_potential.to_string(),
            row.opportunity_score.to_string(),
            row.opportunity_type.to_string(),
            row.priority.to_string(),
            row.answer_potential.to_string(),
            row.intent.to_string(),
            row.aeo_intent.to_string(),
            features,
            row.search_volume.to_string(),
            row.difficulty.to_string(),
            row.cost_per_click.to_string(),
            row.data_source.to_string(),
        ])?;
    }

    finish(writer)
}

/// Serialize the unique keywords to a single-column CSV, preserving the
/// input (score) order. This is the hand-off file for the metrics vendor.
pub fn keywords_csv(rows: &[ScoredOpportunity]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["keyword"])?;

    let mut seen = HashSet::new();
    for row in rows {
        let folded = row.query.to_lowercase();
        if seen.insert(folded) {
            writer.write_record([row.query.as_str()])?;
        }
    }

    finish(writer)
}
