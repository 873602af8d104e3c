//! Natural-language identification.
//!
//! The pipeline only depends on the [`LanguageClassifier`] contract: given
//! text, return a ranked list of `(language, probability)` pairs, or fail.
//! [`ProfileClassifier`] is the default implementation, a character n-gram
//! detector over language profiles in the langdetect JSON format.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ClassificationError, ProfileError};
use crate::types::{LanguageProbability, LanguageRanking};

/// Ranks candidate languages for a piece of text.
pub trait LanguageClassifier: Send + Sync {
    /// Get the name of this classifier.
    fn name(&self) -> &'static str;

    /// Rank candidate languages for `text`, most probable first.
    ///
    /// Fails when no ranking can be produced; callers must not substitute a
    /// default language.
    fn classify(&self, text: &str) -> Result<LanguageRanking, ClassificationError>;
}

/// Longest character n-gram used for detection.
const MAX_NGRAM: usize = 3;
/// Number of independent sampling trials averaged per detection.
const N_TRIAL: usize = 7;
/// Smoothing added to every n-gram probability, before jitter.
const ALPHA_DEFAULT: f64 = 0.5;
/// Per-trial jitter range applied to the smoothing value.
const ALPHA_WIDTH: f64 = 0.05;
const BASE_FREQ: f64 = 10_000.0;
/// Upper bound on samples drawn per trial.
const ITERATION_LIMIT: usize = 1000;
/// A trial stops early once one language exceeds this probability.
const CONV_THRESHOLD: f64 = 0.99999;
/// Languages at or below this probability are not reported.
const PROB_THRESHOLD: f64 = 0.1;

/// A single language profile as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageProfile {
    /// Language code, e.g. "en"
    pub name: String,
    /// Occurrence count per n-gram
    pub freq: HashMap<String, u64>,
    /// Total n-gram counts by length (1-grams, 2-grams, 3-grams)
    pub n_words: Vec<u64>,
}

/// Character n-gram classifier backed by per-language frequency profiles.
///
/// Built once at startup and then shared read-only.
pub struct ProfileClassifier {
    languages: Vec<String>,
    /// Per n-gram, its probability in each language (indexed like `languages`).
    word_probs: HashMap<String, Vec<f64>>,
    seed: u64,
}

impl ProfileClassifier {
    /// Load every profile file in `dir`.
    ///
    /// Files are read in file-name order so language indices, and therefore
    /// results for a given seed, do not depend on directory listing order.
    pub fn load(dir: &Path, seed: u64) -> Result<Self, ProfileError> {
        let entries = fs::read_dir(dir).map_err(|source| ProfileError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ProfileError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut profiles = Vec::with_capacity(files.len());
        for path in files {
            let raw = fs::read_to_string(&path).map_err(|source| ProfileError::Io {
                path: path.clone(),
                source,
            })?;
            let profile: LanguageProfile = serde_json::from_str(&raw)
                .map_err(|source| ProfileError::Parse { path: path.clone(), source })?;
            debug!(path = %path.display(), language = %profile.name, "Loaded language profile");
            profiles.push(profile);
        }

        if profiles.is_empty() {
            return Err(ProfileError::Empty(dir.to_path_buf()));
        }

        let classifier = Self::from_profiles(profiles, seed)?;
        info!(
            languages = classifier.languages.len(),
            ngrams = classifier.word_probs.len(),
            "Language profiles loaded"
        );
        Ok(classifier)
    }

    /// Build a classifier from already-parsed profiles.
    pub fn from_profiles(profiles: Vec<LanguageProfile>, seed: u64) -> Result<Self, ProfileError> {
        let count = profiles.len();
        let mut languages: Vec<String> = Vec::with_capacity(count);
        let mut word_probs: HashMap<String, Vec<f64>> = HashMap::new();

        for (index, profile) in profiles.into_iter().enumerate() {
            if languages.contains(&profile.name) {
                return Err(ProfileError::Duplicate(profile.name));
            }

            for (gram, gram_count) in profile.freq {
                let len = gram.chars().count();
                if len == 0 || len > MAX_NGRAM {
                    continue;
                }
                let total = profile.n_words.get(len - 1).copied().unwrap_or(0);
                if total == 0 {
                    continue;
                }
                let probs = word_probs.entry(gram).or_insert_with(|| vec![0.0; count]);
                probs[index] = gram_count as f64 / total as f64;
            }

            languages.push(profile.name);
        }

        if languages.is_empty() {
            return Err(ProfileError::Empty(Default::default()));
        }

        Ok(Self {
            languages,
            word_probs,
            seed,
        })
    }

    /// Language codes known to this classifier.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Known n-grams of `text`, in text order.
    fn extract_ngrams<'a>(&'a self, text: &str) -> Vec<&'a [f64]> {
        let normalized: String = text
            .chars()
            .flat_map(char::to_lowercase)
            .map(|c| if c.is_alphabetic() { c } else { ' ' })
            .collect();

        let mut found = Vec::new();
        for word in normalized.split_whitespace() {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();

            for n in 1..=MAX_NGRAM {
                for window in padded.windows(n) {
                    if n == 1 && window[0] == ' ' {
                        continue;
                    }
                    let gram: String = window.iter().collect();
                    if let Some(probs) = self.word_probs.get(&gram) {
                        found.push(probs.as_slice());
                    }
                }
            }
        }
        found
    }

    fn detect_block(&self, ngrams: &[&[f64]]) -> Vec<f64> {
        let count = self.languages.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut lang_prob = vec![0.0; count];

        for _ in 0..N_TRIAL {
            let mut prob = vec![1.0 / count as f64; count];
            let alpha = ALPHA_DEFAULT + (rng.gen::<f64>() * 2.0 - 1.0) * ALPHA_WIDTH;
            let weight = alpha / BASE_FREQ;

            let mut i = 0;
            loop {
                let gram = ngrams[rng.gen_range(0..ngrams.len())];
                for (p, word_prob) in prob.iter_mut().zip(gram) {
                    *p *= weight + word_prob;
                }
                if i % 5 == 0 && (normalize(&mut prob) > CONV_THRESHOLD || i >= ITERATION_LIMIT) {
                    break;
                }
                i += 1;
            }

            for (total, p) in lang_prob.iter_mut().zip(&prob) {
                *total += p / N_TRIAL as f64;
            }
        }

        lang_prob
    }
}

/// Scale `prob` to sum to one; returns the largest entry.
fn normalize(prob: &mut [f64]) -> f64 {
    let sum: f64 = prob.iter().sum();
    if sum <= 0.0 {
        let uniform = 1.0 / prob.len() as f64;
        prob.iter_mut().for_each(|p| *p = uniform);
        return uniform;
    }
    let mut max = 0.0;
    for p in prob.iter_mut() {
        *p /= sum;
        if *p > max {
            max = *p;
        }
    }
    max
}

impl LanguageClassifier for ProfileClassifier {
    fn name(&self) -> &'static str {
        "ngram-profile"
    }

    fn classify(&self, text: &str) -> Result<LanguageRanking, ClassificationError> {
        let ngrams = self.extract_ngrams(text);
        if ngrams.is_empty() {
            return Err(ClassificationError::NoFeatures);
        }

        let probabilities = self.detect_block(&ngrams);
        let candidates: Vec<LanguageProbability> = self
            .languages
            .iter()
            .zip(probabilities)
            .filter(|(_, p)| *p > PROB_THRESHOLD)
            .map(|(code, p)| LanguageProbability::new(code.clone(), p))
            .collect();

        if candidates.is_empty() {
            return Err(ClassificationError::NoCandidates);
        }

        Ok(LanguageRanking::new(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EN_PROFILE: &str = r#"{
        "name": "en",
        "freq": {"t": 90, "h": 60, "e": 120, "a": 80, "n": 70, "d": 40,
                 " t": 50, "th": 60, "he": 55, "e ": 45, " a": 30, "an": 35, "nd": 30, "d ": 30,
                 " th": 40, "the": 50, "he ": 40, " an": 25, "and": 30, "nd ": 25},
        "n_words": [1000, 800, 600]
    }"#;

    const FR_PROFILE: &str = r#"{
        "name": "fr",
        "freq": {"l": 80, "e": 130, "s": 90, "u": 60, "o": 50, "n": 60,
                 " l": 50, "le": 60, "es": 55, "s ": 50, " u": 20, "un": 30, "ou": 25,
                 " le": 40, "les": 45, "es ": 40, " un": 20, "une": 25},
        "n_words": [1000, 800, 600]
    }"#;

    fn classifier(seed: u64) -> ProfileClassifier {
        let profiles = vec![
            serde_json::from_str(EN_PROFILE).unwrap(),
            serde_json::from_str(FR_PROFILE).unwrap(),
        ];
        ProfileClassifier::from_profiles(profiles, seed).unwrap()
    }

    #[test]
    fn test_identifies_language() {
        let ranking = classifier(0).classify("the hand and the end").unwrap();
        let top = ranking.top().unwrap();
        assert_eq!(top.code, "en");
        assert!(top.probability > 0.9);

        let ranking = classifier(0).classify("les unes, les autres").unwrap();
        assert_eq!(ranking.top().unwrap().code, "fr");
    }

    #[test]
    fn test_deterministic_for_seed() {
        let text = "the end and les unes";
        let first = classifier(42).classify(text).unwrap();
        let second = classifier(42).classify(text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_probabilities_sorted_and_bounded() {
        let ranking = classifier(7).classify("the les and une").unwrap();
        let probs: Vec<f64> = ranking.entries().iter().map(|e| e.probability).collect();
        assert!(probs.windows(2).all(|w| w[0] >= w[1]));
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_no_features() {
        let result = classifier(0).classify("1234 !!! ???");
        assert_eq!(result, Err(ClassificationError::NoFeatures));

        let result = classifier(0).classify("xyz qqq");
        assert_eq!(result, Err(ClassificationError::NoFeatures));
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let profiles = vec![
            serde_json::from_str(EN_PROFILE).unwrap(),
            serde_json::from_str(EN_PROFILE).unwrap(),
        ];
        assert!(matches!(
            ProfileClassifier::from_profiles(profiles, 0),
            Err(ProfileError::Duplicate(name)) if name == "en"
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fr"), FR_PROFILE).unwrap();
        fs::write(dir.path().join("en"), EN_PROFILE).unwrap();

        let classifier = ProfileClassifier::load(dir.path(), 0).unwrap();
        assert_eq!(classifier.languages(), &["en".to_string(), "fr".to_string()]);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ProfileClassifier::load(dir.path(), 0),
            Err(ProfileError::Empty(_))
        ));

        fs::write(dir.path().join("broken"), "{not json").unwrap();
        assert!(matches!(
            ProfileClassifier::load(dir.path(), 0),
            Err(ProfileError::Parse { .. })
        ));

        assert!(matches!(
            ProfileClassifier::load(&dir.path().join("missing"), 0),
            Err(ProfileError::Io { .. })
        ));
    }
}
