//! Keyword classification heuristics.
//!
//! Search intent, AEO/GEO intent, and SERP-feature estimation are all
//! ordered rule tables over the case-folded keyword text, evaluated
//! first-match-wins. The ordering is a behavioral contract: many keywords
//! match several categories by substring alone, and the first matching
//! category is the assigned one.
//!
//! Question starters ("how", "what", ...) and the `vs` token are matched on
//! word boundaries so that "show" is not a question and "canvas" is not a
//! comparison; phrase terms and the remaining single words match by
//! substring.

use crate::models::{AeoIntent, Intent, SerpFeature};
use regex::Regex;

/// Terms signaling readiness to act.
const TRANSACTIONAL_TERMS: &[&str] = &["buy", "purchase", "price", "cost", "hire", "sign up", "subscribe"];

/// Terms signaling pre-purchase research.
const COMMERCIAL_TERMS: &[&str] = &["best", "top", "review", "compare", "alternative"];

/// Terms signaling learning intent beyond plain question starters.
const LEARNING_TERMS: &[&str] = &["learn", "education", "study", "guide", "tutorial"];

const DEFINITION_TERMS: &[&str] = &["define", "definition", "meaning", "what is", "what does"];
const COMPARISON_TERMS: &[&str] = &["compare", "difference", "better"];
const HOW_TO_TERMS: &[&str] = &["how to", "tutorial", "guide", "step by step"];
const LIST_TERMS: &[&str] = &["list", "examples", "types of", "kinds of"];

const FAQ_TERMS: &[&str] = &["faq", "questions", "common", "frequently"];
const SNIPPET_HOW_TO_TERMS: &[&str] = &["how to", "tutorial", "guide"];
const KNOWLEDGE_PANEL_TERMS: &[&str] = &["what is", "define", "definition"];

fn contains_any(keyword: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| keyword.contains(term))
}

/// Compiled classification rules. Built once at startup and shared by every
/// pipeline run; classification itself is pure.
#[derive(Debug)]
pub struct Classifier {
    /// Question starters recognized by the AEO intent classifier.
    question_intent: Regex,
    /// Question starters that earn the answer-potential question bonus.
    question_bonus: Regex,
    /// Question starters with featured-snippet potential.
    snippet_starter: Regex,
    /// Comparison token, word-bounded.
    versus: Regex,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            question_intent: Regex::new(r"\b(how|what|why|when|where|who|which)\b")
                .expect("static question-intent pattern"),
            question_bonus: Regex::new(r"\b(how|what|why|when|where|who)\b")
                .expect("static question-bonus pattern"),
            snippet_starter: Regex::new(r"\b(how|what|why|when|where)\b")
                .expect("static snippet-starter pattern"),
            versus: Regex::new(r"\b(vs|versus)\b").expect("static versus pattern"),
        }
    }

    /// Classify the traditional search intent behind a keyword.
    ///
    /// Evaluation order: Navigational (brand terms) -> Transactional ->
    /// Commercial -> Informational (question starters or learning terms),
    /// defaulting to Informational.
    pub fn classify_intent(&self, keyword: &str, brand_terms: &[String]) -> Intent {
        let keyword = keyword.to_lowercase();

        if brand_terms.iter().any(|brand| keyword.contains(brand.as_str())) {
            return Intent::Navigational;
        }
        if contains_any(&keyword, TRANSACTIONAL_TERMS) {
            return Intent::Transactional;
        }
        if contains_any(&keyword, COMMERCIAL_TERMS) || self.versus.is_match(&keyword) {
            return Intent::Commercial;
        }
        if self.question_intent.is_match(&keyword) || contains_any(&keyword, LEARNING_TERMS) {
            return Intent::Informational;
        }
        Intent::Informational
    }

    /// Classify the answer-engine intent behind a keyword.
    ///
    /// Evaluation order: Question-Based -> Definition -> Comparison ->
    /// How-To -> List-Based, defaulting to Factual.
    pub fn classify_aeo_intent(&self, keyword: &str) -> AeoIntent {
        let keyword = keyword.to_lowercase();

        if self.question_intent.is_match(&keyword) {
            return AeoIntent::QuestionBased;
        }
        if contains_any(&keyword, DEFINITION_TERMS) {
            return AeoIntent::Definition;
        }
        if self.versus.is_match(&keyword) || contains_any(&keyword, COMPARISON_TERMS) {
            return AeoIntent::Comparison;
        }
        if contains_any(&keyword, HOW_TO_TERMS) {
            return AeoIntent::HowTo;
        }
        if contains_any(&keyword, LIST_TERMS) {
            return AeoIntent::ListBased;
        }
        AeoIntent::Factual
    }

    /// Estimate which SERP features a keyword could plausibly win.
    ///
    /// The four predicates are independent, not mutually exclusive; a
    /// keyword can yield several features. Always non-empty: a keyword
    /// matching nothing gets `Standard Results`.
    pub fn estimate_serp_features(&self, keyword: &str) -> Vec<SerpFeature> {
        let keyword = keyword.to_lowercase();
        let mut features = Vec::new();

        if self.snippet_starter.is_match(&keyword) {
            features.push(SerpFeature::FeaturedSnippet);
        }
        if contains_any(&keyword, FAQ_TERMS) {
            features.push(SerpFeature::Faq);
        }
        if contains_any(&keyword, SNIPPET_HOW_TO_TERMS) {
            features.push(SerpFeature::HowTo);
        }
        if contains_any(&keyword, KNOWLEDGE_PANEL_TERMS) {
            features.push(SerpFeature::KnowledgePanel);
        }

        if features.is_empty() {
            features.push(SerpFeature::StandardResults);
        }
        features
    }

    /// Whether the keyword is phrased as a question, for the
    /// answer-potential question bonus.
    pub fn is_question(&self, keyword: &str) -> bool {
        self.question_bonus.is_match(&keyword.to_lowercase())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
