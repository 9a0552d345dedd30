use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::classify::ClassifierKind;
use crate::classify::delegated::DEFAULT_MAX_INPUT_CHARS;
use crate::classify::heuristic::{HeuristicConfig, ListOverride, TierPolicy};
use crate::config_file::ConfigFile;

pub const DEFAULT_MAX_PAGES: usize = 15;
pub const DEFAULT_OUTPUT_DIR: &str = "processed_notes";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AI_MODEL: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("delegated classifier selected but no endpoint configured")]
    MissingEndpoint,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the external text-generation service.
#[derive(Clone)]
pub struct DelegatedOptions {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
}

impl fmt::Debug for DelegatedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedOptions")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl Default for DelegatedOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: DEFAULT_AI_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

/// Where rendered notes are persisted.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub dir: PathBuf,
    /// Write each run into its own `<dir>/<uuid>/` subdirectory.
    pub per_request_dirs: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            per_request_dirs: false,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_pages: usize,
    pub classifier: ClassifierKind,
    pub heuristic: HeuristicConfig,
    pub delegated: DelegatedOptions,
    pub output: OutputOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            classifier: ClassifierKind::default(),
            heuristic: HeuristicConfig::default(),
            delegated: DelegatedOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl Config {
    /// Apply a (merged) config file over the defaults.
    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(extraction) = &file.extraction
            && let Some(max_pages) = extraction.max_pages
        {
            config.max_pages = max_pages;
        }

        if let Some(output) = &file.output {
            if let Some(dir) = &output.dir {
                config.output.dir = PathBuf::from(dir);
            }
            if let Some(per_request) = output.per_request_dirs {
                config.output.per_request_dirs = per_request;
            }
        }

        if let Some(c) = &file.classifier {
            if let Some(strategy) = &c.strategy {
                config.classifier = strategy.parse().map_err(ConfigError::Invalid)?;
            }
            if let Some(policy) = &c.policy {
                config.heuristic.policy = policy.parse().map_err(ConfigError::Invalid)?;
            }
            config.heuristic.min_sentence_len = c.min_sentence_len;

            let replace = c.replace_keywords.unwrap_or(false);
            let to_override = |list: &Option<Vec<String>>| match list {
                None => ListOverride::Default,
                Some(v) if replace => ListOverride::Replace(v.clone()),
                Some(v) => ListOverride::Extend(v.clone()),
            };
            config.heuristic.easy_keywords = to_override(&c.easy_keywords);
            config.heuristic.medium_keywords = to_override(&c.medium_keywords);
            config.heuristic.hard_keywords = to_override(&c.hard_keywords);

            let delegated = &mut config.delegated;
            delegated.endpoint = c.endpoint.clone();
            delegated.api_key = c.api_key.clone();
            if let Some(model) = &c.model {
                delegated.model = model.clone();
            }
            if let Some(timeout) = c.timeout_secs {
                delegated.timeout_secs = timeout;
            }
            if let Some(max) = c.max_input_chars {
                delegated.max_input_chars = max;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Override settings from `TIERNOTES_*` environment variables, read
    /// through `lookup` (normally `std::env::var(..).ok()`).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let parse_num = |name: &str, value: String| -> Result<u64, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{name} must be a number, got '{value}'")))
        };

        if let Some(dir) = lookup("TIERNOTES_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(strategy) = lookup("TIERNOTES_CLASSIFIER") {
            self.classifier = strategy.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(policy) = lookup("TIERNOTES_TIER_POLICY") {
            self.heuristic.policy = policy.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(endpoint) = lookup("TIERNOTES_AI_ENDPOINT") {
            self.delegated.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("TIERNOTES_AI_API_KEY") {
            self.delegated.api_key = Some(key);
        }
        if let Some(model) = lookup("TIERNOTES_AI_MODEL") {
            self.delegated.model = model;
        }
        if let Some(timeout) = lookup("TIERNOTES_AI_TIMEOUT") {
            self.delegated.timeout_secs = parse_num("TIERNOTES_AI_TIMEOUT", timeout)?;
        }
        if let Some(pages) = lookup("TIERNOTES_MAX_PAGES") {
            self.max_pages = parse_num("TIERNOTES_MAX_PAGES", pages)? as usize;
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        if self.delegated.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "classifier timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}
