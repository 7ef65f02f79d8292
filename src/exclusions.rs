//! Brand-term and deleted-keyword exclusion store.
//!
//! Two sources feed one filter: brand terms are configuration constants,
//! user-deleted keywords are persisted as line-delimited text (one keyword
//! per line, deduplicated, order-insensitive). The pipeline never reads the
//! file directly; it takes a point-in-time [`ExclusionSet`] snapshot at the
//! start of a run and applies it uniformly, so concurrent edits are not
//! observed until the next run.

use crate::errors::AppError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Immutable snapshot of the excluded terms, applied as a single predicate
/// before any scoring occurs.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    terms: Vec<String>,
}

impl ExclusionSet {
    /// Build a snapshot from raw terms: case-folded, trimmed, deduplicated,
    /// empties discarded (an empty term would exclude everything).
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let folded: BTreeSet<String> = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self {
            terms: folded.into_iter().collect(),
        }
    }

    /// Whether a query is excluded: true when any excluded term occurs in
    /// the case-folded query. Substring matching covers both exact deleted
    /// keywords and brand fragments ("acme" excludes "acme login").
    pub fn is_excluded(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.terms.iter().any(|term| query.contains(term.as_str()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Persistent exclusion store: configured brand terms plus the mutable,
/// file-backed set of user-deleted keywords.
#[derive(Debug)]
pub struct ExclusionStore {
    path: PathBuf,
    brand_terms: Vec<String>,
    deleted: RwLock<BTreeSet<String>>,
}

impl ExclusionStore {
    /// Load the deleted-keyword file, tolerating a missing file (no
    /// deletions yet).
    pub async fn load(path: impl Into<PathBuf>, brand_terms: Vec<String>) -> Result<Self, AppError> {
        let path = path.into();
        let deleted = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents
                .lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty())
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        tracing::info!(
            "Exclusion store loaded: {} brand term(s), {} deleted keyword(s)",
            brand_terms.len(),
            deleted.len()
        );

        Ok(Self {
            path,
            brand_terms,
            deleted: RwLock::new(deleted),
        })
    }

    /// Point-in-time snapshot of brand terms plus deleted keywords.
    pub async fn snapshot(&self) -> ExclusionSet {
        let deleted = self.deleted.read().await;
        ExclusionSet::new(self.brand_terms.iter().map(String::as_str).chain(deleted.iter().map(String::as_str)))
    }

    /// Configured brand terms (static for the process lifetime).
    pub fn brand_terms(&self) -> &[String] {
        &self.brand_terms
    }

    /// Current deleted keywords, sorted.
    pub async fn deleted_keywords(&self) -> Vec<String> {
        self.deleted.read().await.iter().cloned().collect()
    }

    /// Add keywords to the deleted set and persist. Returns how many were
    /// newly added.
    pub async fn add(&self, keywords: &[String]) -> Result<usize, AppError> {
        let mut deleted = self.deleted.write().await;
        let before = deleted.len();
        for keyword in keywords {
            let folded = keyword.trim().to_lowercase();
            if !folded.is_empty() {
                deleted.insert(folded);
            }
        }
        let added = deleted.len() - before;
        if added > 0 {
            self.persist(&deleted).await?;
            tracing::info!("Added {} keyword(s) to the exclusion file", added);
        }
        Ok(added)
    }

    /// Remove one keyword from the deleted set and persist. Returns whether
    /// it was present.
    pub async fn remove(&self, keyword: &str) -> Result<bool, AppError> {
        let folded = keyword.trim().to_lowercase();
        let mut deleted = self.deleted.write().await;
        let removed = deleted.remove(&folded);
        if removed {
            self.persist(&deleted).await?;
            tracing::info!("Removed '{}' from the exclusion file", folded);
        }
        Ok(removed)
    }

    async fn persist(&self, deleted: &BTreeSet<String>) -> Result<(), AppError> {
        let mut contents = deleted.iter().cloned().collect::<Vec<_>>().join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_predicate_matches_case_insensitively() {
        let set = ExclusionSet::new(["Brand", "old campaign"]);
        assert!(set.is_excluded("brand xyz login"));
        assert!(set.is_excluded("My BRAND page"));
        assert!(set.is_excluded("the old campaign report"));
        assert!(!set.is_excluded("unbranded query"));
    }

    #[test]
    fn empty_terms_are_discarded() {
        let set = ExclusionSet::new(["", "  ", "real"]);
        assert_eq!(set.len(), 1);
        assert!(!set.is_excluded("anything at all"));
        assert!(set.is_excluded("real thing"));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ExclusionStore::load(dir.path().join("deleted.txt"), vec![])
            .await
            .expect("load");
        assert!(store.deleted_keywords().await.is_empty());
    }

    #[tokio::test]
    async fn add_remove_round_trips_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deleted.txt");

        let store = ExclusionStore::load(&path, vec!["acme".to_string()])
            .await
            .expect("load");
        let added = store
            .add(&["Cheap Tutors".to_string(), "cheap tutors".to_string()])
            .await
            .expect("add");
        assert_eq!(added, 1); // case-folded duplicate collapses

        // Reload from disk: persisted, deduplicated, case-folded
        let reloaded = ExclusionStore::load(&path, vec![]).await.expect("reload");
        assert_eq!(reloaded.deleted_keywords().await, vec!["cheap tutors".to_string()]);

        assert!(store.remove("CHEAP TUTORS").await.expect("remove"));
        assert!(!store.remove("cheap tutors").await.expect("remove again"));
        let reloaded = ExclusionStore::load(&path, vec![]).await.expect("reload");
        assert!(reloaded.deleted_keywords().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_unions_brand_and_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ExclusionStore::load(dir.path().join("deleted.txt"), vec!["acme".to_string()])
            .await
            .expect("load");
        store.add(&["stale keyword".to_string()]).await.expect("add");

        let snapshot = store.snapshot().await;
        assert!(snapshot.is_excluded("acme login"));
        assert!(snapshot.is_excluded("very stale keyword indeed"));
        assert!(!snapshot.is_excluded("fresh keyword"));
    }
}
