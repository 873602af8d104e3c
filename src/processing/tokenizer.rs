//! Whitespace tokenizer producing token frequencies.

use std::sync::Arc;

use crate::error::TokenizationError;
use crate::processing::filter::TokenFilter;
use crate::types::TokenFrequency;

/// Splits content on whitespace and counts cleaned, lowercased tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    filter: Arc<TokenFilter>,
}

impl Tokenizer {
    pub fn new(filter: Arc<TokenFilter>) -> Self {
        Self { filter }
    }

    /// Count every non-empty cleaned token in `content`.
    ///
    /// Content holding NUL characters is rejected as binary.
    pub fn tokenize(&self, content: &str) -> Result<TokenFrequency, TokenizationError> {
        if let Some(offset) = content.find('\0') {
            return Err(TokenizationError::BinaryContent(offset));
        }

        let lowered = content.to_lowercase();
        let mut frequencies = TokenFrequency::new();

        for raw in lowered.split_whitespace() {
            let token = self.filter.clean(raw);
            if token.is_empty() {
                continue;
            }
            *frequencies.entry(token.to_string()).or_insert(0) += 1;
        }

        Ok(frequencies)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Arc::new(TokenFilter::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(exclusions: &[&str]) -> Tokenizer {
        Tokenizer::new(Arc::new(TokenFilter::new(exclusions.iter().copied())))
    }

    #[test]
    fn test_counts_cleaned_tokens() {
        let freq = tokenizer(&["."]).tokenize("hello hello world.").unwrap();
        assert_eq!(freq.len(), 2);
        assert_eq!(freq["hello"], 2);
        assert_eq!(freq["world"], 1);
    }

    #[test]
    fn test_lowercases() {
        let freq = tokenizer(&[]).tokenize("Rust RUST rust").unwrap();
        assert_eq!(freq["rust"], 3);
        assert_eq!(freq.len(), 1);
    }

    #[test]
    fn test_mixed_whitespace() {
        let freq = tokenizer(&[]).tokenize("a\tb\nc\r\n  a").unwrap();
        assert_eq!(freq["a"], 2);
        assert_eq!(freq["b"], 1);
        assert_eq!(freq["c"], 1);
    }

    #[test]
    fn test_fully_excluded_tokens_dropped() {
        let freq = tokenizer(&["-", ","]).tokenize("one - two , --").unwrap();
        assert_eq!(freq.len(), 2);
        assert!(!freq.contains_key(""));
    }

    #[test]
    fn test_blank_content_gives_empty_map() {
        assert!(tokenizer(&[]).tokenize("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_nul() {
        let result = tokenizer(&[]).tokenize("ab\0cd");
        assert_eq!(result, Err(TokenizationError::BinaryContent(2)));
    }
}
