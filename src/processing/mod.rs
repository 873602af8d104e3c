//! Transformation stages applied to each file.
//!
//! This module provides:
//! - Language identification over n-gram profiles
//! - Token edge filtering and whitespace tokenization
//! - Report rendering and subfolder selection

pub mod filter;
pub mod language;
pub mod stats;
pub mod tokenizer;

pub use filter::TokenFilter;
pub use language::{LanguageClassifier, LanguageProfile, ProfileClassifier};
pub use stats::{output_subfolder, StatsFormatter};
pub use tokenizer::Tokenizer;
