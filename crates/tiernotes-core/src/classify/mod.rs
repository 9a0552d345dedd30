//! Tier classification: a [`TextClassifier`] turns sanitized text into
//! paragraph-joined prose per difficulty tier.

pub mod delegated;
pub mod heuristic;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TierTexts;
use crate::config::{Config, ConfigError};
use delegated::{DelegatedClassifier, HttpTextGenerator};
use heuristic::HeuristicClassifier;

/// Sentences per paragraph when re-assembling a tier's text.
pub const SENTENCES_PER_PARAGRAPH: usize = 4;

/// Separator between paragraphs, and between tiers in cumulative text.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Assigns sanitized text to difficulty tiers.
///
/// Implementations never fail: anything that goes wrong internally degrades
/// into placeholder text so the caller always gets three tiers.
pub trait TextClassifier: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &str;

    fn classify<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Future<Output = TierTexts> + Send + 'a>>;
}

/// Which classifier variant to construct at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Heuristic,
    Delegated,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierKind::Heuristic => f.write_str("heuristic"),
            ClassifierKind::Delegated => f.write_str("delegated"),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "keywords" => Ok(ClassifierKind::Heuristic),
            "delegated" | "ai" => Ok(ClassifierKind::Delegated),
            other => Err(format!(
                "unknown classifier '{other}' (expected 'heuristic' or 'delegated')"
            )),
        }
    }
}

/// Construct the configured classifier once, for injection into a pipeline.
pub fn build_classifier(config: &Config) -> Result<Arc<dyn TextClassifier>, ConfigError> {
    match config.classifier {
        ClassifierKind::Heuristic => Ok(Arc::new(HeuristicClassifier::new(
            config.heuristic.clone(),
        ))),
        ClassifierKind::Delegated => {
            let options = &config.delegated;
            let endpoint = options
                .endpoint
                .clone()
                .ok_or(ConfigError::MissingEndpoint)?;
            let generator = HttpTextGenerator::new(
                endpoint,
                options.api_key.clone(),
                options.model.clone(),
                Duration::from_secs(options.timeout_secs),
            )?;
            Ok(Arc::new(
                DelegatedClassifier::new(Arc::new(generator))
                    .with_max_input_chars(options.max_input_chars),
            ))
        }
    }
}

/// Group sentences into paragraphs of [`SENTENCES_PER_PARAGRAPH`], separated
/// by blank lines.
pub fn join_paragraphs<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .chunks(SENTENCES_PER_PARAGRAPH)
        .map(|chunk| {
            chunk
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK)
}
