//! Token edge filtering.
//!
//! Strips configured "non-token" substrings (punctuation, quotes, markup
//! leftovers) from the start and end of raw tokens.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Exclusion rules applied to the edges of a token.
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    /// Lowercased, non-empty exclusion strings, longest first.
    exclusions: Vec<String>,
}

impl TokenFilter {
    /// Create a filter from exclusion entries.
    ///
    /// Entries are trimmed and lowercased; empty entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exclusions: Vec<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        // Longest match wins so overlapping entries strip deterministically.
        exclusions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        exclusions.dedup();

        Self { exclusions }
    }

    /// Parse a line-delimited exclusion list.
    pub fn parse(list: &str) -> Self {
        Self::new(list.lines())
    }

    /// Load the exclusion list from a file, one entry per line.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let list = fs::read_to_string(path).map_err(|source| ConfigError::ExclusionList {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&list))
    }

    /// Strip excluded suffixes, then excluded prefixes, each to a fixed point.
    ///
    /// Returns an empty string when nothing survives.
    pub fn clean<'a>(&self, token: &'a str) -> &'a str {
        let mut result = token;

        while let Some(excluded) = self.matching_suffix(result) {
            result = &result[..result.len() - excluded.len()];
        }
        while let Some(excluded) = self.matching_prefix(result) {
            result = &result[excluded.len()..];
        }

        result
    }

    fn matching_suffix(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        self.exclusions
            .iter()
            .map(String::as_str)
            .find(|e| text.ends_with(e))
    }

    fn matching_prefix(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        self.exclusions
            .iter()
            .map(String::as_str)
            .find(|e| text.starts_with(e))
    }

    /// Exclusion entries, longest first.
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn len(&self) -> usize {
        self.exclusions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty()
    }
}
