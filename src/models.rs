use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============ Telemetry Models ============

/// One raw row of search-performance telemetry, as reported by the
/// search-console API for a single query over the reporting window.
///
/// Raw rows are untrusted: counts may be negative or inconsistent and the
/// position may be non-finite. The pipeline normalizer validates each row
/// into a [`KeywordRecord`] and drops the ones that fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPerformanceRecord {
    /// The keyword/phrase, case-preserved for display.
    pub query: String,
    /// Total clicks over the window.
    pub clicks: i64,
    /// Total impressions over the window.
    pub impressions: i64,
    /// Reported click-through rate in [0, 1].
    pub ctr: f64,
    /// Average ranking position; 1.0 is the top organic result.
    pub position: f64,
}

/// A validated telemetry row in canonical shape. Immutable once produced;
/// every scoring stage derives from it without mutating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordRecord {
    pub query: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

// ============ Classification Enums ============

/// Traditional search intent behind a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Informational,
    Navigational,
    Commercial,
    Transactional,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Informational => "Informational",
            Intent::Navigational => "Navigational",
            Intent::Commercial => "Commercial",
            Intent::Transactional => "Transactional",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer-engine (AEO/GEO) intent behind a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeoIntent {
    #[serde(rename = "Question-Based")]
    QuestionBased,
    Definition,
    Comparison,
    #[serde(rename = "How-To")]
    HowTo,
    #[serde(rename = "List-Based")]
    ListBased,
    Factual,
}

impl AeoIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AeoIntent::QuestionBased => "Question-Based",
            AeoIntent::Definition => "Definition",
            AeoIntent::Comparison => "Comparison",
            AeoIntent::HowTo => "How-To",
            AeoIntent::ListBased => "List-Based",
            AeoIntent::Factual => "Factual",
        }
    }
}

impl fmt::Display for AeoIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SERP feature a query could plausibly win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SerpFeature {
    #[serde(rename = "Featured Snippet")]
    FeaturedSnippet,
    #[serde(rename = "FAQ")]
    Faq,
    #[serde(rename = "How-To")]
    HowTo,
    #[serde(rename = "Knowledge Panel")]
    KnowledgePanel,
    #[serde(rename = "Standard Results")]
    StandardResults,
}

impl SerpFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerpFeature::FeaturedSnippet => "Featured Snippet",
            SerpFeature::Faq => "FAQ",
            SerpFeature::HowTo => "How-To",
            SerpFeature::KnowledgePanel => "Knowledge Panel",
            SerpFeature::StandardResults => "Standard Results",
        }
    }
}

impl fmt::Display for SerpFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of optimization work a scored keyword calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityType {
    /// Ranking well but under-clicked; a snippet/title problem, not a
    /// ranking problem.
    #[serde(rename = "CTR Optimization")]
    CtrOptimization,
    #[serde(rename = "Top 3 Push")]
    Top3Push,
    #[serde(rename = "Top 10 Push")]
    Top10Push,
    #[serde(rename = "First Page Push")]
    FirstPagePush,
    #[serde(rename = "Long-term Target")]
    LongTermTarget,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::CtrOptimization => "CTR Optimization",
            OpportunityType::Top3Push => "Top 3 Push",
            OpportunityType::Top10Push => "Top 10 Push",
            OpportunityType::FirstPagePush => "First Page Push",
            OpportunityType::LongTermTarget => "Long-term Target",
        }
    }
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority tier derived from the opportunity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the enriched volume/difficulty/CPC figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    Authoritative,
    Estimated,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Authoritative => "Authoritative",
            DataSource::Estimated => "Estimated",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Enrichment Models ============

/// Third-party keyword metrics for one normalized keyword, either taken from
/// the authoritative dataset or synthesized from the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    /// Estimated monthly search volume; never less than observed impressions.
    pub search_volume: u64,
    /// Ranking difficulty in [0, 100].
    pub difficulty: u8,
    /// Average cost per click; 0.0 when no signal is available.
    pub cost_per_click: f64,
    /// Free-text SERP feature list as reported by the dataset, if any.
    pub serp_features_raw: String,
    /// True when the figures came from the authoritative dataset.
    pub has_authoritative_data: bool,
}

// ============ Scored Output ============

/// The enriched, scored view of one query. Derived from exactly one
/// [`KeywordRecord`] plus at most one metrics lookup; no field depends on any
/// other row, so records can be scored in any order (or in parallel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredOpportunity {
    pub query: String,
    pub position: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub intent: Intent,
    pub aeo_intent: AeoIntent,
    pub serp_feature_candidates: Vec<SerpFeature>,
    /// Benchmark CTR for this position.
    pub expected_ctr: f64,
    /// max(0, expected_ctr - ctr).
    pub ctr_gap: f64,
    /// floor(impressions * ctr_gap): additional clicks available from closing
    /// the CTR gap alone.
    pub traffic_potential: u64,
    pub opportunity_score: f64,
    pub answer_potential: f64,
    pub opportunity_type: OpportunityType,
    pub priority: Priority,
    pub search_volume: u64,
    pub difficulty: u8,
    pub cost_per_click: f64,
    pub data_source: DataSource,
}

// ============ Report Models ============

/// Counts per priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Counts per opportunity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpportunityTypeBreakdown {
    pub ctr_optimization: usize,
    pub top3_push: usize,
    pub top10_push: usize,
    pub first_page_push: usize,
    pub long_term_target: usize,
}

/// Summary aggregates over one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_keywords: usize,
    pub priorities: PriorityBreakdown,
    pub opportunity_types: OpportunityTypeBreakdown,
    /// Sum of per-row traffic potential: additional monthly clicks available.
    pub total_traffic_potential: u64,
    pub question_based: usize,
    /// Rows scored from heuristic estimates rather than authoritative data.
    pub estimated_rows: usize,
    pub avg_position: f64,
    pub avg_opportunity_score: f64,
}

/// The full result of one analysis run: the sorted scored opportunities plus
/// run metadata. Reports are immutable snapshots; re-running the analysis
/// constructs a new report rather than mutating a cached one.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub site_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Raw rows returned by the telemetry source.
    pub fetched: usize,
    /// Rows dropped by the normalizer as malformed.
    pub dropped_malformed: usize,
    /// Rows removed by the brand/deleted-keyword exclusion filter.
    pub excluded: usize,
    /// Rows removed by the serving thresholds (position, impressions,
    /// query length).
    pub below_thresholds: usize,
    /// True when the run used heuristic enrichment only because the metrics
    /// dataset was unavailable or empty.
    pub degraded_enrichment: bool,
    pub metrics_fingerprint: Option<String>,
    pub summary: AnalysisSummary,
    pub opportunities: Vec<ScoredOpportunity>,
}

// ============ Request Models ============

/// Query parameters for the opportunity listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityQuery {
    pub days_back: Option<i64>,
    pub priority: Option<Priority>,
    pub opportunity_type: Option<OpportunityType>,
    pub intent: Option<Intent>,
    pub min_impressions: Option<i64>,
    pub max_position: Option<f64>,
    pub min_score: Option<f64>,
    pub limit: Option<usize>,
}

/// Query parameters for the AEO/GEO listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerQuery {
    pub days_back: Option<i64>,
    pub min_potential: Option<f64>,
    pub questions_only: Option<bool>,
    pub min_impressions: Option<i64>,
    pub limit: Option<usize>,
}

/// Request body for adding deleted keywords to the exclusion set.
#[derive(Debug, Clone, Deserialize)]
pub struct AddExclusionsRequest {
    pub keywords: Vec<String>,
}
