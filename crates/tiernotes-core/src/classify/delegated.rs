use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TextClassifier;
use crate::{Tier, TierTexts};

/// Inputs shorter than this are not worth a round trip.
pub const MIN_INPUT_CHARS: usize = 50;

/// Default cap on how much text is sent to the service.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 15_000;

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("input too short to classify ({0} chars)")]
    InputTooShort(usize),
    #[error("no JSON object found in response")]
    NoJson,
    #[error("malformed tier JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A text-generation service: takes a prompt, returns free-form text.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ClassificationError>> + Send + 'a>>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// [`TextGenerator`] that POSTs `{"model", "prompt"}` JSON to an endpoint and
/// returns the raw response body.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl fmt::Debug for HttpTextGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTextGenerator")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .finish()
    }
}

impl HttpTextGenerator {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ClassificationError>> + Send + 'a>> {
        Box::pin(async move {
            let mut request = self.client.post(&self.endpoint).json(&GenerateRequest {
                model: &self.model,
                prompt,
            });
            if let Some(ref key) = self.api_key {
                request = request.bearer_auth(key);
            }

            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ClassificationError::Status(status.as_u16()));
            }
            Ok(resp.text().await?)
        })
    }
}

/// Classifier that delegates tier assignment to an external text generator.
///
/// Never fails: any error is logged and replaced by [`fallback_texts`].
pub struct DelegatedClassifier {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl DelegatedClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// The fallible path; [`TextClassifier::classify`] wraps it.
    pub async fn try_classify(&self, text: &str) -> Result<TierTexts, ClassificationError> {
        let chars = text.chars().count();
        if chars < MIN_INPUT_CHARS {
            return Err(ClassificationError::InputTooShort(chars));
        }
        let prompt = build_prompt(truncate_chars(text, self.max_input_chars));
        let response = self.generator.generate(&prompt).await?;
        parse_tier_response(&response)
    }
}

impl TextClassifier for DelegatedClassifier {
    fn name(&self) -> &str {
        "delegated"
    }

    fn classify<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Future<Output = TierTexts> + Send + 'a>> {
        Box::pin(async move {
            match self.try_classify(text).await {
                Ok(texts) => texts,
                Err(e) => {
                    tracing::warn!(error = %e, "delegated classification failed, using fallback");
                    fallback_texts()
                }
            }
        })
    }
}

/// Fixed triple returned whenever delegated classification fails.
pub fn fallback_texts() -> TierTexts {
    TierTexts {
        easy: "Core concepts could not be generated automatically for this document. \
               Review the original notes for key definitions."
            .to_string(),
        medium: "Process details could not be generated automatically for this document. \
                 Review the original notes for methods and applications."
            .to_string(),
        hard: "Advanced analysis could not be generated automatically for this document. \
               Review the original notes for theory and implications."
            .to_string(),
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"Sort the following lecture notes into three difficulty levels.

"easy": core concepts and definitions.
"medium": processes, methods and applications.
"hard": theory, analysis and advanced implications.

Rewrite each level as short paragraphs separated by blank lines.
Respond with JSON only, with exactly the keys "easy", "medium" and "hard", each a string:
{{"easy":"...","medium":"...","hard":"..."}}

NOTES:
{}"#,
        text
    )
}

/// Longest prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The first complete JSON object in `text`, ignoring commentary before and
/// after it. A `{` that does not open a valid object is skipped.
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let rest = &text[start..];
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match values.next() {
            Some(Ok(serde_json::Value::Object(_))) => Some(&rest[..values.byte_offset()]),
            _ => None,
        }
    })
}

#[derive(Deserialize)]
struct TierResponse {
    easy: String,
    medium: String,
    hard: String,
}

/// Parse a free-form service response into tier texts.
///
/// All three keys must be present; blank values fall back to the tier's
/// placeholder.
pub fn parse_tier_response(response: &str) -> Result<TierTexts, ClassificationError> {
    let json = extract_json_object(response).ok_or(ClassificationError::NoJson)?;
    let parsed: TierResponse = serde_json::from_str(json)?;
    let fill = |value: String, tier: Tier| {
        if value.trim().is_empty() {
            tier.placeholder().to_string()
        } else {
            value.trim().to_string()
        }
    };
    Ok(TierTexts {
        easy: fill(parsed.easy, Tier::Easy),
        medium: fill(parsed.medium, Tier::Medium),
        hard: fill(parsed.hard, Tier::Hard),
    })
}


#[cfg(test)]
mod tests {
    use super::mock::{MockGenerator, MockReply};
    use super::*;

    const NOTES: &str = "Photosynthesis is the process by which plants convert light into chemical energy. \
                         The theory behind it involves the electron transport chain.";

    #[test]
    fn test_extract_json_object_ignores_commentary() {
        let raw = "Sure! Here you go:\n```json\n{\"easy\":\"a\",\"medium\":\"b\",\"hard\":\"c\"}\n```\nThanks";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"easy\":\"a\",\"medium\":\"b\",\"hard\":\"c\"}")
        );
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_extract_json_object_stops_at_first_object() {
        let raw = "{\"easy\":\"a\",\"medium\":\"b\",\"hard\":\"c\"} \
                   Let me know if you need more {details}.";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"easy\":\"a\",\"medium\":\"b\",\"hard\":\"c\"}")
        );
        let texts = parse_tier_response(raw).unwrap();
        assert_eq!(texts.easy, "a");
        assert_eq!(texts.hard, "c");
    }

    #[test]
    fn test_extract_json_object_skips_braces_in_preamble() {
        let raw = "Tiers {as requested}: {\"easy\":\"x\",\"medium\":\"y\",\"hard\":\"z\"}";
        let texts = parse_tier_response(raw).unwrap();
        assert_eq!(texts.medium, "y");
    }

    #[test]
    fn test_extract_json_object_unclosed_is_none() {
        assert_eq!(extract_json_object("{\"easy\":\"a\""), None);
        assert!(matches!(
            parse_tier_response("prefix {\"easy\":"),
            Err(ClassificationError::NoJson)
        ));
    }

    #[test]
    fn test_parse_tier_response_missing_key() {
        let err = parse_tier_response("{\"easy\":\"a\",\"medium\":\"b\"}").unwrap_err();
        assert!(matches!(err, ClassificationError::Json(_)));
    }

    #[test]
    fn test_parse_tier_response_blank_value_uses_placeholder() {
        let texts = parse_tier_response("{\"easy\":\"a\",\"medium\":\"  \",\"hard\":\"c\"}").unwrap();
        assert_eq!(texts.medium, Tier::Medium.placeholder());
        assert_eq!(texts.easy, "a");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[tokio::test]
    async fn test_successful_classification() {
        let generator = Arc::new(MockGenerator::text(
            "Result: {\"easy\":\"Plants use light.\",\"medium\":\"Light reactions.\",\"hard\":\"Electron transport theory.\"}",
        ));
        let classifier = DelegatedClassifier::new(generator.clone());
        let texts = classifier.classify(NOTES).await;
        assert_eq!(texts.easy, "Plants use light.");
        assert_eq!(texts.hard, "Electron transport theory.");
        assert_eq!(generator.call_count(), 1);
        assert!(generator.last_prompt().unwrap().contains("Photosynthesis"));
    }

    #[tokio::test]
    async fn test_service_error_falls_back() {
        let generator = Arc::new(MockGenerator::new(MockReply::Status(503)));
        let classifier = DelegatedClassifier::new(generator);
        assert_eq!(classifier.classify(NOTES).await, fallback_texts());
    }

    #[tokio::test]
    async fn test_non_json_reply_falls_back() {
        let generator = Arc::new(MockGenerator::text("I cannot help with that."));
        let classifier = DelegatedClassifier::new(generator);
        assert!(matches!(
            classifier.try_classify(NOTES).await,
            Err(ClassificationError::NoJson)
        ));
        assert_eq!(classifier.classify(NOTES).await, fallback_texts());
    }

    #[tokio::test]
    async fn test_short_input_skips_service() {
        let generator = Arc::new(MockGenerator::text("{}"));
        let classifier = DelegatedClassifier::new(generator.clone());
        assert_eq!(classifier.classify("Too short.").await, fallback_texts());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_input_truncated_before_sending() {
        let generator = Arc::new(MockGenerator::text("nothing"));
        let classifier = DelegatedClassifier::new(generator.clone()).with_max_input_chars(60);
        let long = format!("{}{}", "a".repeat(60), "OVERFLOW-MARKER");
        let _ = classifier.classify(&long).await;
        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains(&"a".repeat(60)));
        assert!(!prompt.contains("OVERFLOW-MARKER"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let generator = HttpTextGenerator::new(
            "http://127.0.0.1:9/generate".to_string(),
            Some("secret".to_string()),
            "any-model".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(!format!("{generator:?}").contains("secret"));
        let classifier = DelegatedClassifier::new(Arc::new(generator));
        assert_eq!(classifier.classify(NOTES).await, fallback_texts());
    }
}
