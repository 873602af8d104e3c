//! Core types for the ingestion service.

mod config;
mod work;

pub use config::{ServiceConfig, ENV_PREFIX};
pub use work::{LanguageProbability, LanguageRanking, StatsReport, TokenFrequency, WorkItem};
