//! Values flowing through the pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One dequeued file: its absolute path plus the content read at dequeue time.
#[derive(Debug, Clone)]
pub struct WorkItem {
    source_path: PathBuf,
    content: String,
}

impl WorkItem {
    pub fn new(source_path: PathBuf, content: String) -> Self {
        Self {
            source_path,
            content,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A candidate language and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProbability {
    /// Language code, e.g. "en"
    pub code: String,
    /// Probability in [0, 1]
    pub probability: f64,
}

impl LanguageProbability {
    pub fn new(code: impl Into<String>, probability: f64) -> Self {
        Self {
            code: code.into(),
            probability,
        }
    }
}

/// Candidate languages ordered by descending probability.
///
/// Entries with equal probability keep the order the classifier produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageRanking {
    entries: Vec<LanguageProbability>,
}

impl LanguageRanking {
    /// Build a ranking, sorting descending by probability (stable).
    pub fn new(mut entries: Vec<LanguageProbability>) -> Self {
        entries.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Self { entries }
    }

    pub fn top(&self) -> Option<&LanguageProbability> {
        self.entries.first()
    }

    /// Whether the top entry meets `threshold`.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.top().map_or(false, |top| top.probability >= threshold)
    }

    pub fn entries(&self) -> &[LanguageProbability] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(&'static str, f64)> for LanguageRanking {
    fn from_iter<I: IntoIterator<Item = (&'static str, f64)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(code, probability)| LanguageProbability::new(code, probability))
                .collect(),
        )
    }
}

/// Occurrence count per cleaned, lowercased token.
pub type TokenFrequency = HashMap<String, usize>;

/// Rendered statistics for one file, plus the subfolder it is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub language_section: String,
    pub frequency_section: String,
    /// Top language code, or "ambiguous"
    pub subfolder: String,
}

impl StatsReport {
    /// Full file contents: language section, blank line, frequency section.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.language_section, self.frequency_section)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.subfolder == crate::AMBIGUOUS_SUBFOLDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_sorted_descending() {
        let ranking: LanguageRanking = [("fr", 0.05), ("en", 0.92)].into_iter().collect();
        assert_eq!(ranking.top().unwrap().code, "en");
        assert_eq!(ranking.len(), 2);
    }

    #[test]
    fn test_ranking_ties_keep_order() {
        let ranking: LanguageRanking = [("de", 0.5), ("nl", 0.5)].into_iter().collect();
        let codes: Vec<_> = ranking.entries().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["de", "nl"]);
    }

    #[test]
    fn test_confidence() {
        let ranking: LanguageRanking = [("en", 0.6)].into_iter().collect();
        assert!(ranking.is_confident(0.6));
        assert!(!ranking.is_confident(0.61));
        assert!(!LanguageRanking::default().is_confident(0.0));
    }
}
