//! Keyword-metrics dataset store and enrichment fallback.
//!
//! Authoritative per-keyword metrics (search volume, difficulty, CPC) come
//! from vendor CSV exports dropped into a data directory. The store is built
//! once at startup and treated as a read-only snapshot for the lifetime of
//! the process; refreshing the dataset means constructing a new store, never
//! mutating this one. A missing entry is the expected "no authoritative
//! data" case and falls back to heuristic estimation from the record itself.

use crate::models::KeywordMetrics;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

/// Commercial terms used by the difficulty heuristic.
const COMMERCIAL_DIFFICULTY_TERMS: &[&str] = &["best", "top", "review", "compare"];

/// One row of a vendor CSV export. Numeric columns arrive as free text
/// ("1,204", blanks) and are parsed leniently.
#[derive(Debug, Deserialize)]
struct MetricsRow {
    #[serde(rename = "Keyword")]
    keyword: String,
    #[serde(rename = "Volume", default)]
    volume: Option<String>,
    #[serde(rename = "Difficulty", default)]
    difficulty: Option<String>,
    #[serde(rename = "CPC", default)]
    cpc: Option<String>,
    #[serde(rename = "SERP Features", default)]
    serp_features: Option<String>,
}

/// Parsed metrics for one keyword, as stored in the snapshot.
#[derive(Debug, Clone, PartialEq)]
struct StoredMetrics {
    volume: u64,
    difficulty: u8,
    cpc: f64,
    serp_features: String,
}

/// Read-only lookup of authoritative keyword metrics, keyed by case-folded,
/// trimmed keyword text.
#[derive(Debug, Default)]
pub struct MetricsStore {
    entries: HashMap<String, StoredMetrics>,
    fingerprint: Option<String>,
}

impl MetricsStore {
    /// An empty store: every lookup falls back to heuristic estimation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `*.csv` file under `dir` into one snapshot.
    ///
    /// Files are visited in name order and duplicate keywords resolve by
    /// first-seen precedence. A file that fails to parse is skipped with a
    /// warning; an unreadable directory is an error the caller downgrades to
    /// degraded (empty-store) operation.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        paths.sort();

        let mut entries = HashMap::new();
        let mut hasher = Sha256::new();
        let mut loaded_files = 0usize;

        for path in &paths {
            let contents = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Skipping unreadable metrics file {}: {}", path.display(), e);
                    continue;
                }
            };
            hasher.update(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
            hasher.update(&contents);

            match Self::parse_file(&contents, &mut entries) {
                Ok(rows) => {
                    loaded_files += 1;
                    tracing::info!("Loaded {} keywords from {}", rows, path.display());
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed metrics file {}: {}", path.display(), e);
                }
            }
        }

        let fingerprint = if loaded_files > 0 {
            Some(hex::encode(hasher.finalize()))
        } else {
            None
        };

        tracing::info!(
            "Metrics snapshot ready: {} unique keywords from {} file(s)",
            entries.len(),
            loaded_files
        );

        Ok(Self { entries, fingerprint })
    }

    fn parse_file(
        contents: &[u8],
        entries: &mut HashMap<String, StoredMetrics>,
    ) -> anyhow::Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents);

        let mut rows = 0usize;
        let mut bad_rows = 0usize;
        for row in reader.deserialize::<MetricsRow>() {
            let row = match row {
                Ok(row) => row,
                Err(_) => {
                    bad_rows += 1;
                    continue;
                }
            };
            let key = row.keyword.trim().to_lowercase();
            if key.is_empty() {
                bad_rows += 1;
                continue;
            }
            rows += 1;
            // First-seen precedence, both within and across files
            entries.entry(key).or_insert_with(|| StoredMetrics {
                volume: parse_count(row.volume.as_deref()),
                difficulty: parse_count(row.difficulty.as_deref()).min(100) as u8,
                cpc: parse_money(row.cpc.as_deref()),
                serp_features: row.serp_features.unwrap_or_default(),
            });
        }
        if bad_rows > 0 {
            tracing::warn!("Ignored {} unparseable metrics row(s)", bad_rows);
        }
        if rows == 0 && bad_rows > 0 {
            anyhow::bail!("no parseable rows");
        }
        Ok(rows)
    }

    /// Number of keywords in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 over the loaded dataset files, identifying this snapshot.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Whether the dataset has an authoritative entry for this keyword.
    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(&keyword.trim().to_lowercase())
    }

    /// Look up metrics for a keyword, falling back to heuristic estimates.
    ///
    /// On a hit the stored volume is floored at the observed impressions: a
    /// keyword cannot generate more impressions than total searches, so a
    /// dataset under-report never shrinks known exposure. On a miss the
    /// estimate uses `impressions * 5` (conservative) and the difficulty
    /// heuristic below.
    pub fn enrich(&self, keyword: &str, impressions: u64, brand_terms: &[String]) -> KeywordMetrics {
        let key = keyword.trim().to_lowercase();
        match self.entries.get(&key) {
            Some(stored) => KeywordMetrics {
                search_volume: stored.volume.max(impressions),
                difficulty: stored.difficulty,
                cost_per_click: stored.cpc,
                serp_features_raw: stored.serp_features.clone(),
                has_authoritative_data: true,
            },
            None => KeywordMetrics {
                search_volume: impressions.saturating_mul(5).max(impressions),
                difficulty: estimate_difficulty(&key, brand_terms),
                cost_per_click: 0.0,
                serp_features_raw: String::new(),
                has_authoritative_data: false,
            },
        }
    }
}

/// Heuristic keyword difficulty when no authoritative data exists.
///
/// Checked in order: long-tail (>= 4 words) -> 30, brand term -> 20,
/// commercial term -> 70, default 50.
pub fn estimate_difficulty(keyword: &str, brand_terms: &[String]) -> u8 {
    let keyword = keyword.to_lowercase();
    if keyword.split_whitespace().count() >= 4 {
        30
    } else if brand_terms.iter().any(|brand| keyword.contains(brand.as_str())) {
        20
    } else if COMMERCIAL_DIFFICULTY_TERMS.iter().any(|term| keyword.contains(term)) {
        70
    } else {
        50
    }
}

/// Parse an integer count out of vendor CSV text, tolerating thousands
/// separators, decimals, and blanks (which read as 0).
fn parse_count(raw: Option<&str>) -> u64 {
    raw.map(|s| s.replace(',', ""))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

/// Parse a monetary value out of vendor CSV text; blanks read as 0.0.
fn parse_money(raw: Option<&str>) -> f64 {
    raw.map(|s| s.replace(['$', ','], ""))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_from_csv(csv: &str) -> MetricsStore {
        let mut entries = HashMap::new();
        MetricsStore::parse_file(csv.as_bytes(), &mut entries).expect("parse test csv");
        MetricsStore {
            entries,
            fingerprint: None,
        }
    }

    #[test]
    fn hit_returns_authoritative_data() {
        let store = store_from_csv(
            "Keyword,Volume,Difficulty,CPC,SERP Features\nmath tutor,1200,45,3.50,Featured snippet",
        );
        let metrics = store.enrich("Math Tutor ", 100, &[]);
        assert!(metrics.has_authoritative_data);
        assert_eq!(metrics.search_volume, 1200);
        assert_eq!(metrics.difficulty, 45);
        assert_eq!(metrics.cost_per_click, 3.5);
        assert_eq!(metrics.serp_features_raw, "Featured snippet");
    }

    #[test]
    fn hit_volume_floored_at_impressions() {
        let store = store_from_csv("Keyword,Volume,Difficulty,CPC\nmath tutor,0,45,1.00");
        let metrics = store.enrich("math tutor", 800, &[]);
        assert!(metrics.has_authoritative_data);
        assert_eq!(metrics.search_volume, 800);
    }

    #[test]
    fn miss_estimates_from_impressions() {
        let store = MetricsStore::empty();
        let metrics = store.enrich("how to teach math", 500, &[]);
        assert!(!metrics.has_authoritative_data);
        assert_eq!(metrics.search_volume, 2500);
        assert_eq!(metrics.difficulty, 30); // four words -> long-tail
        assert_eq!(metrics.cost_per_click, 0.0);
    }

    #[test]
    fn difficulty_heuristic_order() {
        let brand = vec!["acme".to_string()];
        // Long-tail wins even over brand
        assert_eq!(estimate_difficulty("acme online math tutoring", &brand), 30);
        assert_eq!(estimate_difficulty("acme tutoring", &brand), 20);
        assert_eq!(estimate_difficulty("best tutoring", &brand), 70);
        assert_eq!(estimate_difficulty("tutoring", &brand), 50);
    }

    #[test]
    fn duplicate_keywords_keep_first_seen() {
        let store = store_from_csv(
            "Keyword,Volume,Difficulty,CPC\nmath tutor,1200,45,3.50\nMath Tutor,9999,90,9.99",
        );
        let metrics = store.enrich("math tutor", 0, &[]);
        assert_eq!(metrics.search_volume, 1200);
        assert_eq!(metrics.difficulty, 45);
    }

    #[test]
    fn lenient_numeric_parsing() {
        let store = store_from_csv("Keyword,Volume,Difficulty,CPC\nmath tutor,\"12,400\",,");
        let metrics = store.enrich("math tutor", 0, &[]);
        assert_eq!(metrics.search_volume, 12_400);
        assert_eq!(metrics.difficulty, 0);
        assert_eq!(metrics.cost_per_click, 0.0);
    }

    #[test]
    fn load_dir_combines_files_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut a = std::fs::File::create(dir.path().join("a.csv")).unwrap();
        writeln!(a, "Keyword,Volume,Difficulty,CPC").unwrap();
        writeln!(a, "math tutor,1200,45,3.50").unwrap();
        let mut b = std::fs::File::create(dir.path().join("b.csv")).unwrap();
        writeln!(b, "Keyword,Volume,Difficulty,CPC").unwrap();
        writeln!(b, "math tutor,1,1,0.10").unwrap();
        writeln!(b, "algebra help,300,20,0.80").unwrap();

        let store = MetricsStore::load_dir(dir.path()).expect("load");
        assert_eq!(store.len(), 2);
        assert!(store.fingerprint().is_some());
        // a.csv sorts first, so its row wins
        assert_eq!(store.enrich("math tutor", 0, &[]).search_volume, 1200);
        assert!(store.contains("ALGEBRA HELP"));
    }

    #[test]
    fn load_dir_missing_directory_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(MetricsStore::load_dir(&missing).is_err());
    }
}
