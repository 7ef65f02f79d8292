//! The batch scoring pipeline.
//!
//! One deterministic transform over an in-memory record set:
//! Normalize -> Exclude -> Classify+Estimate -> Enrich -> Score -> Sort.
//! Every per-record stage is a pure function of that record plus the
//! read-only metrics snapshot, so no row depends on any other row and the
//! only global step is the final sort. Malformed rows are dropped and
//! counted; a bad row never aborts the batch.

use crate::classify::Classifier;
use crate::ctr;
use crate::exclusions::ExclusionSet;
use crate::metrics::MetricsStore;
use crate::models::{
    AeoIntent, AnalysisSummary, DataSource, KeywordRecord, OpportunityType, Priority,
    PriorityBreakdown, OpportunityTypeBreakdown, RawPerformanceRecord, ScoredOpportunity,
};
use crate::scoring;

/// Everything a pipeline run needs, borrowed for the duration of the run.
/// The caller assembles this from point-in-time snapshots; nothing here is
/// mutated by the pipeline.
pub struct AnalysisContext<'a> {
    pub classifier: &'a Classifier,
    pub metrics: &'a MetricsStore,
    pub exclusions: &'a ExclusionSet,
    pub brand_terms: &'a [String],
}

/// Result of one pipeline run over a raw batch.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Scored rows, sorted by opportunity score descending (ties broken by
    /// impressions descending, then position ascending).
    pub opportunities: Vec<ScoredOpportunity>,
    pub fetched: usize,
    pub dropped_malformed: usize,
    pub excluded: usize,
}

/// Validate and coerce one raw telemetry row into canonical shape.
///
/// Returns `None` for malformed rows: empty query, non-finite position,
/// negative counts, or clicks exceeding impressions. A reported CTR outside
/// [0, 1] (or non-finite) is recomputed from clicks/impressions rather than
/// rejected, since the counts are the source of truth.
pub fn normalize(raw: &RawPerformanceRecord) -> Option<KeywordRecord> {
    let query = raw.query.trim();
    if query.is_empty() {
        return None;
    }
    if !raw.position.is_finite() {
        return None;
    }
    if raw.impressions < 0 || raw.clicks < 0 || raw.clicks > raw.impressions {
        return None;
    }

    let impressions = raw.impressions as u64;
    let clicks = raw.clicks as u64;
    let ctr = if raw.ctr.is_finite() && (0.0..=1.0).contains(&raw.ctr) {
        raw.ctr
    } else if impressions > 0 {
        clicks as f64 / impressions as f64
    } else {
        0.0
    };

    Some(KeywordRecord {
        query: query.to_string(),
        clicks,
        impressions,
        ctr,
        position: raw.position,
    })
}

/// Classify, enrich, and score one validated record. Pure: depends only on
/// the record and the read-only context.
pub fn score_record(record: &KeywordRecord, ctx: &AnalysisContext<'_>) -> ScoredOpportunity {
    let intent = ctx.classifier.classify_intent(&record.query, ctx.brand_terms);
    let aeo_intent = ctx.classifier.classify_aeo_intent(&record.query);
    let serp_feature_candidates = ctx.classifier.estimate_serp_features(&record.query);

    let metrics = ctx
        .metrics
        .enrich(&record.query, record.impressions, ctx.brand_terms);

    let expected_ctr = ctr::expected_ctr(record.position);
    let ctr_gap = ctr::ctr_gap(record.position, record.ctr);
    let traffic_potential = ctr::traffic_potential(record.impressions, ctr_gap);

    let opportunity = scoring::score_opportunity(record, &metrics, traffic_potential);
    let answer_potential = scoring::score_answer_potential(ctx.classifier, record);

    ScoredOpportunity {
        query: record.query.clone(),
        position: record.position,
        impressions: record.impressions,
        clicks: record.clicks,
        ctr: record.ctr,
        intent,
        aeo_intent,
        serp_feature_candidates,
        expected_ctr,
        ctr_gap,
        traffic_potential,
        opportunity_score: opportunity.score,
        answer_potential,
        opportunity_type: opportunity.opportunity_type,
        priority: opportunity.priority,
        data_source: if metrics.has_authoritative_data {
            DataSource::Authoritative
        } else {
            DataSource::Estimated
        },
        search_volume: metrics.search_volume,
        difficulty: metrics.difficulty,
        cost_per_click: metrics.cost_per_click,
    }
}

/// Run the full pipeline over a raw batch.
pub fn analyze(records: &[RawPerformanceRecord], ctx: &AnalysisContext<'_>) -> AnalysisOutcome {
    let fetched = records.len();

    let normalized: Vec<KeywordRecord> = records.iter().filter_map(normalize).collect();
    let dropped_malformed = fetched - normalized.len();
    if dropped_malformed > 0 {
        tracing::warn!("Dropped {} malformed telemetry row(s)", dropped_malformed);
    }

    let kept: Vec<KeywordRecord> = normalized
        .into_iter()
        .filter(|record| !ctx.exclusions.is_excluded(&record.query))
        .collect();
    let excluded = fetched - dropped_malformed - kept.len();

    let mut opportunities: Vec<ScoredOpportunity> =
        kept.iter().map(|record| score_record(record, ctx)).collect();

    // Stable sort: score desc, impressions desc, position asc
    opportunities.sort_by(|a, b| {
        b.opportunity_score
            .total_cmp(&a.opportunity_score)
            .then_with(|| b.impressions.cmp(&a.impressions))
            .then_with(|| a.position.total_cmp(&b.position))
    });

    AnalysisOutcome {
        opportunities,
        fetched,
        dropped_malformed,
        excluded,
    }
}

/// Aggregate summary figures over scored rows.
pub fn summarize(rows: &[ScoredOpportunity]) -> AnalysisSummary {
    let mut priorities = PriorityBreakdown::default();
    let mut types = OpportunityTypeBreakdown::default();
    let mut total_traffic_potential = 0u64;
    let mut question_based = 0usize;
    let mut estimated_rows = 0usize;
    let mut position_sum = 0.0f64;
    let mut score_sum = 0.0f64;

    for row in rows {
        match row.priority {
            Priority::High => priorities.high += 1,
            Priority::Medium => priorities.medium += 1,
            Priority::Low => priorities.low += 1,
        }
        match row.opportunity_type {
            OpportunityType::CtrOptimization => types.ctr_optimization += 1,
            OpportunityType::Top3Push => types.top3_push += 1,
            OpportunityType::Top10Push => types.top10_push += 1,
            OpportunityType::FirstPagePush => types.first_page_push += 1,
            OpportunityType::LongTermTarget => types.long_term_target += 1,
        }
        total_traffic_potential += row.traffic_potential;
        if row.aeo_intent == AeoIntent::QuestionBased {
            question_based += 1;
        }
        if row.data_source == DataSource::Estimated {
            estimated_rows += 1;
        }
        position_sum += row.position;
        score_sum += row.opportunity_score;
    }

    let count = rows.len();
    AnalysisSummary {
        total_keywords: count,
        priorities,
        opportunity_types: types,
        total_traffic_potential,
        question_based,
        estimated_rows,
        avg_position: if count > 0 { position_sum / count as f64 } else { 0.0 },
        avg_opportunity_score: if count > 0 { score_sum / count as f64 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_malformed_rows() {
        let base = RawPerformanceRecord {
            query: "algebra help".to_string(),
            clicks: 10,
            impressions: 100,
            ctr: 0.1,
            position: 5.0,
        };
        assert!(normalize(&base).is_some());

        let empty_query = RawPerformanceRecord { query: "   ".to_string(), ..base.clone() };
        assert!(normalize(&empty_query).is_none());

        let nan_position = RawPerformanceRecord { position: f64::NAN, ..base.clone() };
        assert!(normalize(&nan_position).is_none());

        let negative_impressions = RawPerformanceRecord { impressions: -1, ..base.clone() };
        assert!(normalize(&negative_impressions).is_none());

        let clicks_exceed = RawPerformanceRecord { clicks: 101, ..base };
        assert!(normalize(&clicks_exceed).is_none());
    }

    #[test]
    fn normalize_recomputes_out_of_range_ctr() {
        let raw = RawPerformanceRecord {
            query: "algebra help".to_string(),
            clicks: 25,
            impressions: 100,
            ctr: 7.5,
            position: 5.0,
        };
        let record = normalize(&raw).expect("valid record");
        assert_eq!(record.ctr, 0.25);

        let no_impressions = RawPerformanceRecord {
            impressions: 0,
            clicks: 0,
            ctr: f64::NAN,
            ..raw
        };
        assert_eq!(normalize(&no_impressions).expect("valid").ctr, 0.0);
    }

    #[test]
    fn normalize_trims_query_for_display() {
        let raw = RawPerformanceRecord {
            query: "  Algebra Help  ".to_string(),
            clicks: 0,
            impressions: 10,
            ctr: 0.0,
            position: 3.0,
        };
        assert_eq!(normalize(&raw).expect("valid").query, "Algebra Help");
    }
}
