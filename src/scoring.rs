//! Opportunity and answer-potential scorers.
//!
//! Two weighted multi-factor scores, both on a 0-100 scale but tuned for
//! different goals. The SEO opportunity score weighs ranking position,
//! enriched search volume, difficulty, and the CTR-gap traffic upside. The
//! AEO answer-potential score uses a steeper position curve and raw
//! impressions, because answer-engine eligibility concentrates near the top
//! of the first page. The two are intentionally independent; do not unify
//! their constants.

use crate::classify::Classifier;
use crate::models::{KeywordMetrics, KeywordRecord, OpportunityType, Priority};

/// Result of scoring one record against the SEO opportunity lens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpportunityScore {
    pub score: f64,
    pub opportunity_type: OpportunityType,
    pub priority: Priority,
}

/// Score one record on the 0-100 SEO opportunity scale.
///
/// Weighted sum of four normalized sub-scores: position 40%, volume 30%
/// (log-compressed so low-end differences matter more, capped to bound
/// outliers), difficulty 20% (lower is better), and CTR-gap traffic 10%.
pub fn score_opportunity(
    record: &KeywordRecord,
    metrics: &KeywordMetrics,
    traffic_potential: u64,
) -> OpportunityScore {
    let position_score = ((101.0 - record.position) / 100.0).max(0.0) * 100.0;
    let volume_score =
        ((metrics.search_volume.max(1) as f64).log10() / 5.5).min(1.0) * 100.0;
    let difficulty_score = ((100.0 - f64::from(metrics.difficulty)) / 100.0).max(0.0) * 100.0;
    let traffic_score = (traffic_potential as f64 / 100.0).min(1.0) * 100.0;

    let score = (position_score * 0.4
        + volume_score * 0.3
        + difficulty_score * 0.2
        + traffic_score * 0.1)
        .clamp(0.0, 100.0);

    OpportunityScore {
        score,
        opportunity_type: opportunity_type(record.position, record.ctr, record.impressions),
        priority: priority_for(score),
    }
}

/// Derive the opportunity type from position/impression thresholds.
///
/// Evaluated in order, first match wins; the gaps between the position bands
/// (e.g. 3 < position < 4 with a healthy CTR) deliberately fall through to
/// `Long-term Target`.
pub fn opportunity_type(position: f64, ctr: f64, impressions: u64) -> OpportunityType {
    if position <= 3.0 && ctr < 0.15 {
        OpportunityType::CtrOptimization
    } else if (4.0..=10.0).contains(&position) && impressions >= 100 {
        OpportunityType::Top3Push
    } else if (11.0..=20.0).contains(&position) && impressions >= 50 {
        OpportunityType::Top10Push
    } else if (21.0..=30.0).contains(&position) && impressions >= 25 {
        OpportunityType::FirstPagePush
    } else {
        OpportunityType::LongTermTarget
    }
}

/// Priority tier for a final opportunity score.
pub fn priority_for(score: f64) -> Priority {
    if score >= 70.0 {
        Priority::High
    } else if score >= 40.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Score one record on the 0-100 answer-engine potential scale.
///
/// Position 40% on a curve that zeroes out past position 20, impressions 30%
/// (log divisor 4; enriched volume is deliberately not consulted here),
/// question format 20%, and query length 10% (longer queries suit direct
/// answers).
pub fn score_answer_potential(classifier: &Classifier, record: &KeywordRecord) -> f64 {
    let position_score = ((21.0 - record.position.min(20.0)) / 20.0).max(0.0) * 100.0;
    let volume_score = ((record.impressions.max(1) as f64).log10() / 4.0).min(1.0) * 100.0;
    let question_score = if classifier.is_question(&record.query) {
        100.0
    } else {
        50.0
    };
    let words = record.query.split_whitespace().count();
    let length_score = if words >= 4 {
        100.0
    } else if words == 3 {
        70.0
    } else {
        40.0
    };

    (position_score * 0.4 + volume_score * 0.3 + question_score * 0.2 + length_score * 0.1)
        .clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str, position: f64, impressions: u64, clicks: u64, ctr: f64) -> KeywordRecord {
        KeywordRecord {
            query: query.to_string(),
            clicks,
            impressions,
            ctr,
            position,
        }
    }

    fn estimated(volume: u64, difficulty: u8) -> KeywordMetrics {
        KeywordMetrics {
            search_volume: volume,
            difficulty,
            cost_per_click: 0.0,
            serp_features_raw: String::new(),
            has_authoritative_data: false,
        }
    }

    #[test]
    fn best_case_clamps_to_one_hundred() {
        let r = record("how to teach math online", 1.0, 1_000_000_000, 0, 0.0);
        let m = estimated(1_000_000_000, 0);
        let scored = score_opportunity(&r, &m, 1_000_000);
        assert!(scored.score <= 100.0);
        assert!(scored.score >= 99.0, "got {}", scored.score);
        assert_eq!(scored.priority, Priority::High);
    }

    #[test]
    fn worst_case_floors_at_zero() {
        let r = record("xyz", 1000.0, 0, 0, 0.0);
        let m = estimated(0, 100);
        let scored = score_opportunity(&r, &m, 0);
        assert!(scored.score >= 0.0);
        assert!(scored.score < 40.0);
        assert_eq!(scored.priority, Priority::Low);
        assert_eq!(scored.opportunity_type, OpportunityType::LongTermTarget);
    }

    #[test]
    fn type_ladder_first_match_wins() {
        // Top 3 but under-clicked: a snippet problem
        assert_eq!(opportunity_type(2.0, 0.05, 1000), OpportunityType::CtrOptimization);
        // Top 3 with healthy CTR falls through the ladder entirely
        assert_eq!(opportunity_type(2.0, 0.25, 1000), OpportunityType::LongTermTarget);
        assert_eq!(opportunity_type(4.2, 0.08, 500), OpportunityType::Top3Push);
        assert_eq!(opportunity_type(15.0, 0.01, 60), OpportunityType::Top10Push);
        assert_eq!(opportunity_type(25.0, 0.0, 30), OpportunityType::FirstPagePush);
        // Right band, too few impressions
        assert_eq!(opportunity_type(15.0, 0.01, 10), OpportunityType::LongTermTarget);
        // Band gap between 3 and 4
        assert_eq!(opportunity_type(3.5, 0.2, 1000), OpportunityType::LongTermTarget);
    }

    #[test]
    fn priority_tiers() {
        assert_eq!(priority_for(70.0), Priority::High);
        assert_eq!(priority_for(69.9), Priority::Medium);
        assert_eq!(priority_for(40.0), Priority::Medium);
        assert_eq!(priority_for(39.9), Priority::Low);
    }

    #[test]
    fn answer_potential_in_bounds() {
        let c = Classifier::new();
        let high = score_answer_potential(&c, &record("how to teach math online", 1.0, 100_000, 0, 0.0));
        assert!(high <= 100.0);
        assert!(high > 90.0, "got {high}");

        let low = score_answer_potential(&c, &record("xyz", 500.0, 0, 0, 0.0));
        assert!(low >= 0.0);
        // Position clamps at 20 (2.0) + no volume + no question (10.0) + short (4.0)
        assert!((low - 16.0).abs() < 1e-9, "got {low}");
    }

    #[test]
    fn question_format_earns_bonus() {
        let c = Classifier::new();
        let question = score_answer_potential(&c, &record("what is algebra", 5.0, 100, 0, 0.0));
        let statement = score_answer_potential(&c, &record("algebra for kids", 5.0, 100, 0, 0.0));
        assert!(question > statement);
        assert!((question - statement - 10.0).abs() < 1e-9);
    }
}
