//! Report rendering.

use std::cmp::Ordering;
use std::fmt::Write;

use crate::types::{LanguageRanking, StatsReport, TokenFrequency};
use crate::{AMBIGUOUS_SUBFOLDER, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_LANGUAGES_TO_SHOW};

const LANGUAGE_HEADER: &str = "Language probability stats\n\n";
const FREQUENCY_HEADER: &str = "Tokens count stats\n\n";

/// Renders language rankings and token counts into a deterministic report.
#[derive(Debug, Clone)]
pub struct StatsFormatter {
    threshold: f64,
    languages_to_show: usize,
}

impl Default for StatsFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_LANGUAGES_TO_SHOW)
    }
}

impl StatsFormatter {
    pub fn new(threshold: f64, languages_to_show: usize) -> Self {
        Self {
            threshold,
            languages_to_show,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Build the report and pick its subfolder.
    pub fn format(&self, ranking: &LanguageRanking, frequencies: &TokenFrequency) -> StatsReport {
        StatsReport {
            language_section: self.language_section(ranking),
            frequency_section: frequency_section(frequencies),
            subfolder: output_subfolder(ranking, self.threshold),
        }
    }

    /// Top ranked languages as `<code>: <probability>` lines.
    ///
    /// Probabilities always keep a fractional part (`1.0`, not `1`).
    pub fn language_section(&self, ranking: &LanguageRanking) -> String {
        let mut out = String::from(LANGUAGE_HEADER);
        for entry in ranking.entries().iter().take(self.languages_to_show) {
            let _ = writeln!(out, "{}: {:?}", entry.code, entry.probability);
        }
        out
    }
}

/// Every token as `<token>: <count>`, by count descending then token descending.
pub fn frequency_section(frequencies: &TokenFrequency) -> String {
    let mut out = String::from(FREQUENCY_HEADER);
    for (token, count) in sorted_frequencies(frequencies) {
        let _ = writeln!(out, "{}: {}", token, count);
    }
    out
}

/// Token counts ordered by count descending, ties by token descending.
pub fn sorted_frequencies(frequencies: &TokenFrequency) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = frequencies
        .iter()
        .map(|(token, count)| (token.as_str(), *count))
        .collect();
    entries.sort_by(|a, b| match b.1.cmp(&a.1) {
        Ordering::Equal => b.0.cmp(a.0),
        other => other,
    });
    entries
}

/// The top language's code when it meets `threshold`, otherwise "ambiguous".
pub fn output_subfolder(ranking: &LanguageRanking, threshold: f64) -> String {
    match ranking.top() {
        Some(top) if top.probability >= threshold => top.code.clone(),
        _ => AMBIGUOUS_SUBFOLDER.to_string(),
    }
}
