use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{TextClassifier, join_paragraphs};
use crate::{Tier, TierTexts};

/// A run of non-terminal characters followed by terminal punctuation.
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());

pub const DEFAULT_EASY_KEYWORDS: &[&str] = &[
    "is", "are", "defined", "basic", "simple", "who", "what", "fact", "example",
];

pub const DEFAULT_MEDIUM_KEYWORDS: &[&str] = &[
    "how",
    "process",
    "function",
    "connect",
    "result",
    "method",
    "application",
    "interaction",
    "system",
    "because",
];

pub const DEFAULT_HARD_KEYWORDS: &[&str] = &[
    "theory",
    "critique",
    "advanced",
    "implication",
    "analysis",
    "framework",
    "mechanism",
    "structure",
    "significant",
    "hypothesis",
];

/// Controls how a keyword list is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Tier-assignment rule set.
///
/// Two rule sets have been used for this scoring; both are kept so they can be
/// compared, and `Weighted` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierPolicy {
    /// Weights easy 1, medium 3, hard 5.
    /// Hard: hard ≥ 5 or length > 200. Medium: medium ≥ 3 or both medium and
    /// easy matched. Otherwise easy.
    #[default]
    Weighted,
    /// Plain keyword counts.
    /// Hard: any hard keyword or length > 150. Medium: any medium keyword or
    /// no easy keyword. Otherwise easy.
    Simple,
}

impl TierPolicy {
    /// Per-keyword weight for each tier: `(easy, medium, hard)`.
    pub fn weights(&self) -> (u32, u32, u32) {
        match self {
            TierPolicy::Weighted => (1, 3, 5),
            TierPolicy::Simple => (1, 1, 1),
        }
    }

    /// Sentences shorter than this (after trimming) are dropped.
    pub fn default_min_sentence_len(&self) -> usize {
        match self {
            TierPolicy::Weighted => 25,
            TierPolicy::Simple => 20,
        }
    }

    pub fn assign(&self, scores: Scores, len: usize) -> Tier {
        match self {
            TierPolicy::Weighted => {
                if scores.hard >= 5 || len > 200 {
                    Tier::Hard
                } else if scores.medium >= 3 || (scores.medium > 0 && scores.easy > 0) {
                    Tier::Medium
                } else {
                    Tier::Easy
                }
            }
            TierPolicy::Simple => {
                if scores.hard > 0 || len > 150 {
                    Tier::Hard
                } else if scores.medium > 0 || scores.easy == 0 {
                    Tier::Medium
                } else {
                    Tier::Easy
                }
            }
        }
    }
}

impl FromStr for TierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weighted" => Ok(TierPolicy::Weighted),
            "simple" => Ok(TierPolicy::Simple),
            other => Err(format!(
                "unknown tier policy '{other}' (expected 'weighted' or 'simple')"
            )),
        }
    }
}

/// Keyword scores of one sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeuristicConfig {
    pub policy: TierPolicy,
    /// `None` uses the policy's default minimum.
    pub min_sentence_len: Option<usize>,
    pub easy_keywords: ListOverride<String>,
    pub medium_keywords: ListOverride<String>,
    pub hard_keywords: ListOverride<String>,
}

/// Sentences sorted into tiers, in document order within each tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierBuckets {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

impl TierBuckets {
    pub fn get(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
        }
    }

    fn push(&mut self, tier: Tier, sentence: String) {
        match tier {
            Tier::Easy => self.easy.push(sentence),
            Tier::Medium => self.medium.push(sentence),
            Tier::Hard => self.hard.push(sentence),
        }
    }

    pub fn len(&self) -> usize {
        self.easy.len() + self.medium.len() + self.hard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Local, deterministic keyword-scoring classifier.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    policy: TierPolicy,
    min_sentence_len: usize,
    easy_keywords: Vec<String>,
    medium_keywords: Vec<String>,
    hard_keywords: Vec<String>,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(HeuristicConfig::default())
    }
}

impl HeuristicClassifier {
    pub fn new(config: HeuristicConfig) -> Self {
        let resolve = |list: &ListOverride<String>, defaults: &[&str]| -> Vec<String> {
            let defaults: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
            list.resolve(&defaults)
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };

        Self {
            policy: config.policy,
            min_sentence_len: config
                .min_sentence_len
                .unwrap_or_else(|| config.policy.default_min_sentence_len()),
            easy_keywords: resolve(&config.easy_keywords, DEFAULT_EASY_KEYWORDS),
            medium_keywords: resolve(&config.medium_keywords, DEFAULT_MEDIUM_KEYWORDS),
            hard_keywords: resolve(&config.hard_keywords, DEFAULT_HARD_KEYWORDS),
        }
    }

    pub fn policy(&self) -> TierPolicy {
        self.policy
    }

    pub fn min_sentence_len(&self) -> usize {
        self.min_sentence_len
    }

    /// Substring-containment scores of an already lower-cased sentence.
    pub fn score(&self, lower: &str) -> Scores {
        let (easy_w, medium_w, hard_w) = self.policy.weights();
        let count = |keywords: &[String]| -> u32 {
            keywords.iter().filter(|k| lower.contains(k.as_str())).count() as u32
        };
        Scores {
            easy: count(&self.easy_keywords) * easy_w,
            medium: count(&self.medium_keywords) * medium_w,
            hard: count(&self.hard_keywords) * hard_w,
        }
    }

    /// Split `text` into sentences and assign each kept sentence to a tier.
    pub fn buckets(&self, text: &str) -> TierBuckets {
        let mut buckets = TierBuckets::default();
        for m in SENTENCE_RE.find_iter(text) {
            let sentence = m.as_str().trim();
            let len = sentence.chars().count();
            if len < self.min_sentence_len {
                continue;
            }
            let scores = self.score(&sentence.to_lowercase());
            buckets.push(self.policy.assign(scores, len), sentence.to_string());
        }
        buckets
    }

    /// Paragraph-joined text per tier, with placeholders for empty tiers.
    pub fn classify_sync(&self, text: &str) -> TierTexts {
        let buckets = self.buckets(text);
        tracing::debug!(
            easy = buckets.easy.len(),
            medium = buckets.medium.len(),
            hard = buckets.hard.len(),
            "heuristic classification"
        );
        let render = |tier: Tier| {
            let sentences = buckets.get(tier);
            if sentences.is_empty() {
                tier.placeholder().to_string()
            } else {
                join_paragraphs(sentences)
            }
        };
        TierTexts {
            easy: render(Tier::Easy),
            medium: render(Tier::Medium),
            hard: render(Tier::Hard),
        }
    }
}

impl TextClassifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn classify<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Future<Output = TierTexts> + Send + 'a>> {
        Box::pin(async move { self.classify_sync(text) })
    }
}
