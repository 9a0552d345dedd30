use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregate;
pub mod backend;
pub mod classify;
pub mod config;
pub mod config_file;
pub mod encode;
pub mod pipeline;
pub mod render;
pub mod sanitize;

// Re-export for convenience
pub use aggregate::aggregate;
pub use backend::{BackendError, PdfBackend};
pub use classify::delegated::{
    ClassificationError, DelegatedClassifier, HttpTextGenerator, TextGenerator,
};
pub use classify::heuristic::{HeuristicClassifier, HeuristicConfig, TierPolicy};
pub use classify::{ClassifierKind, TextClassifier, build_classifier};
pub use config::{Config, ConfigError, DelegatedOptions, OutputOptions};
pub use encode::{EncodedNotes, persist_and_encode};
pub use pipeline::Pipeline;
pub use render::{RenderError, render_note};
pub use sanitize::sanitize;

/// Difficulty tier assigned to a sentence or to an output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }

    /// File name the rendered note for this tier is persisted under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Tier::Easy => "easy.pdf",
            Tier::Medium => "medium.pdf",
            Tier::Hard => "hard.pdf",
        }
    }

    /// Banner title drawn at the top of the rendered note.
    pub fn title(&self) -> &'static str {
        match self {
            Tier::Easy => "CORE CONCEPTS",
            Tier::Medium => "DETAILED PROCESSES",
            Tier::Hard => "FULL THEORETICAL ANALYSIS",
        }
    }

    /// Text used when a tier ends up with no content.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Tier::Easy => "Foundational overview.",
            Tier::Medium => "Detailed process analysis.",
            Tier::Hard => "Advanced structural implications.",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paragraph-joined prose per tier, as produced by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTexts {
    pub easy: String,
    pub medium: String,
    pub hard: String,
}

impl TierTexts {
    /// Every tier set to its placeholder.
    pub fn placeholders() -> Self {
        Self {
            easy: Tier::Easy.placeholder().to_string(),
            medium: Tier::Medium.placeholder().to_string(),
            hard: Tier::Hard.placeholder().to_string(),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
        }
    }
}

/// Cumulative text per tier: harder tiers are supersets of easier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeNotes {
    pub easy: String,
    pub medium: String,
    pub hard: String,
}

impl CumulativeNotes {
    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
        }
    }
}

/// The three rendered PDF documents of one pipeline run.
#[derive(Debug, Clone)]
pub struct RenderedNotes {
    pub easy: Vec<u8>,
    pub medium: Vec<u8>,
    pub hard: Vec<u8>,
}

impl RenderedNotes {
    pub fn get(&self, tier: Tier) -> &[u8] {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to parse document: {0}")]
    DocumentParse(#[from] BackendError),
    #[error("background task failed: {0}")]
    Task(String),
}
