//! Service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IDLE_DELAY_MS, DEFAULT_INPUT_PATH,
    DEFAULT_LANGUAGES_TO_SHOW, DEFAULT_OUTPUT_PATH,
};

/// Prefix for environment overrides (`LANGWATCH_INPUT_PATH`, ...).
pub const ENV_PREFIX: &str = "LANGWATCH";

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory tree that is watched for new files
    pub input_path: PathBuf,

    /// Root for `<language>/<relative-path>_stats.txt` reports
    pub output_path: PathBuf,

    /// Root holding `processed/` and `failed/`; defaults to `output_path`
    #[serde(default)]
    pub archive_path: Option<PathBuf>,

    /// Minimum top-language probability for a confident identification
    pub confidence_threshold: f64,

    /// Directory of language profile files
    pub language_profiles_path: PathBuf,

    /// Line-delimited list of substrings stripped from token edges
    pub nontoken_file: PathBuf,

    /// Seed for the detector's sampling trials
    pub detector_seed: u64,

    /// Sleep between polls when the backlog is empty
    pub idle_delay_ms: u64,

    /// Number of ranked languages listed in a report
    pub languages_to_show: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            archive_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            language_profiles_path: PathBuf::from("profiles"),
            nontoken_file: PathBuf::from("nontokens.txt"),
            detector_seed: 0,
            idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
            languages_to_show: DEFAULT_LANGUAGES_TO_SHOW,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from defaults, an optional config file, and
    /// `LANGWATCH_*` environment variables, in increasing precedence.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("input_path", path_str(&defaults.input_path))?
            .set_default("output_path", path_str(&defaults.output_path))?
            .set_default("confidence_threshold", defaults.confidence_threshold)?
            .set_default(
                "language_profiles_path",
                path_str(&defaults.language_profiles_path),
            )?
            .set_default("nontoken_file", path_str(&defaults.nontoken_file))?
            .set_default("detector_seed", defaults.detector_seed)?
            .set_default("idle_delay_ms", defaults.idle_delay_ms)?
            .set_default("languages_to_show", defaults.languages_to_show as u64)?;

        if let Some(file) = config_file {
            builder = builder.add_source(config::File::with_name(&path_str(file)).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Root holding the `processed/` and `failed/` trees.
    pub fn archive_root(&self) -> &Path {
        self.archive_path.as_deref().unwrap_or(&self.output_path)
    }

    /// Check the configuration before anything starts watching.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.confidence_threshold));
        }

        if self.languages_to_show == 0 {
            return Err(ConfigError::Invalid {
                field: "languages_to_show",
                message: "must be at least 1".to_string(),
            });
        }

        if !self.input_path.is_dir() {
            return Err(ConfigError::MissingInput(self.input_path.clone()));
        }

        let input = absolute(&self.input_path);
        if absolute(&self.output_path).starts_with(&input) {
            return Err(ConfigError::NestedInInput {
                field: "output_path",
                path: self.output_path.clone(),
            });
        }
        if absolute(self.archive_root()).starts_with(&input) {
            return Err(ConfigError::NestedInInput {
                field: "archive_path",
                path: self.archive_root().to_path_buf(),
            });
        }

        Ok(())
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Resolve symlinks where the path exists, otherwise anchor it at the cwd.
fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ServiceConfig {
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        ServiceConfig {
            input_path: input,
            output_path: dir.path().join("output"),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.languages_to_show, 5);
        assert_eq!(config.archive_root(), config.output_path.as_path());
    }

    #[test]
    fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        assert!(config_in(&dir).validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);

        config.confidence_threshold = 0.0;
        assert!(config.validate().is_ok());
        config.confidence_threshold = 1.0;
        assert!(config.validate().is_ok());

        config.confidence_threshold = 1.01;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
        config.confidence_threshold = -0.1;
        assert!(config.validate().is_err());
        config.confidence_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            input_path: dir.path().join("nope"),
            output_path: dir.path().join("output"),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingInput(_))));
    }

    #[test]
    fn test_output_inside_input_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.output_path = config.input_path.join("out");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NestedInInput { field: "output_path", .. })
        ));

        let mut config = config_in(&dir);
        config.archive_path = Some(config.input_path.clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NestedInInput { field: "archive_path", .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("langwatch.toml");
        std::fs::write(
            &file,
            "input_path = \"/data/in\"\nconfidence_threshold = 0.75\nlanguages_to_show = 3\n",
        )
        .unwrap();

        let config = ServiceConfig::load(Some(&file)).unwrap();
        assert_eq!(config.input_path, PathBuf::from("/data/in"));
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.languages_to_show, 3);
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
    }
}
