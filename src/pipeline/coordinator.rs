//! Pipeline coordinator: classify, tokenize, format.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{FailureKind, PipelineError, PipelineStage};
use crate::processing::{LanguageClassifier, StatsFormatter, Tokenizer};
use crate::types::{StatsReport, WorkItem};

/// Runs the transformation stages for one work item.
///
/// Stages run strictly in order and the first failure short-circuits the
/// rest. Nothing here touches the filesystem and nothing is retried.
pub struct PipelineCoordinator {
    classifier: Arc<dyn LanguageClassifier>,
    tokenizer: Tokenizer,
    formatter: StatsFormatter,
}

impl PipelineCoordinator {
    pub fn new(
        classifier: Arc<dyn LanguageClassifier>,
        tokenizer: Tokenizer,
        formatter: StatsFormatter,
    ) -> Self {
        Self {
            classifier,
            tokenizer,
            formatter,
        }
    }

    /// Produce the report for `item`, or the stage that failed and why.
    pub fn process(&self, item: &WorkItem) -> Result<StatsReport, PipelineError> {
        let path = item.source_path();

        let ranking = self.classifier.classify(item.content()).map_err(|e| {
            PipelineError::new(PipelineStage::Classify, FailureKind::ClassificationError(e))
        })?;

        if let Some(top) = ranking.top() {
            if ranking.is_confident(self.formatter.threshold()) {
                info!(
                    path = %path.display(),
                    language = %top.code,
                    probability = top.probability,
                    "Language identified"
                );
            } else {
                info!(
                    path = %path.display(),
                    best = %top.code,
                    probability = top.probability,
                    "Could not identify language, ambiguous file"
                );
            }
        }

        let frequencies = self.tokenizer.tokenize(item.content()).map_err(|e| {
            PipelineError::new(PipelineStage::Tokenize, FailureKind::TokenizationError(e))
        })?;

        if frequencies.is_empty() {
            warn!(path = %path.display(), "No tokens identified");
        } else {
            info!(path = %path.display(), tokens = frequencies.len(), "Tokens identified");
        }

        Ok(self.formatter.format(&ranking, &frequencies))
    }

    pub fn classifier(&self) -> &dyn LanguageClassifier {
        self.classifier.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassificationError;
    use crate::processing::TokenFilter;
    use crate::types::LanguageRanking;
    use std::path::PathBuf;

    struct FixedClassifier {
        ranking: Result<LanguageRanking, ClassificationError>,
    }

    impl LanguageClassifier for FixedClassifier {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn classify(&self, _text: &str) -> Result<LanguageRanking, ClassificationError> {
            self.ranking.clone()
        }
    }

    fn coordinator(ranking: Result<LanguageRanking, ClassificationError>) -> PipelineCoordinator {
        PipelineCoordinator::new(
            Arc::new(FixedClassifier { ranking }),
            Tokenizer::new(Arc::new(TokenFilter::new(["."]))),
            StatsFormatter::new(0.6, 5),
        )
    }

    fn item(content: &str) -> WorkItem {
        WorkItem::new(PathBuf::from("/in/doc.txt"), content.to_string())
    }

    #[test]
    fn test_success() {
        let ranking = [("en", 0.92), ("fr", 0.05)].into_iter().collect();
        let report = coordinator(Ok(ranking))
            .process(&item("hello hello world."))
            .unwrap();

        assert_eq!(report.subfolder, "en");
        assert!(report.language_section.contains("en: 0.92\n"));
        assert!(report.frequency_section.ends_with("hello: 2\nworld: 1\n"));
    }

    #[test]
    fn test_ambiguous_is_success() {
        let ranking = [("en", 0.4), ("fr", 0.35)].into_iter().collect();
        let report = coordinator(Ok(ranking)).process(&item("bonjour hello")).unwrap();
        assert!(report.is_ambiguous());
    }

    #[test]
    fn test_classification_failure_short_circuits() {
        let err = coordinator(Err(ClassificationError::NoFeatures))
            .process(&item("12 34"))
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Classify);
    }

    #[test]
    fn test_tokenization_failure() {
        let ranking = [("en", 0.99)].into_iter().collect();
        let err = coordinator(Ok(ranking)).process(&item("bin\0ary")).unwrap_err();
        assert_eq!(err.stage, PipelineStage::Tokenize);
    }
}
