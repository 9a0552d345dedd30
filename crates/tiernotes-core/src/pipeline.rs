use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinError;

use crate::classify::TextClassifier;
use crate::config::{Config, OutputOptions};
use crate::encode::{EncodedNotes, persist_and_encode};
use crate::render::{error_document, render_note};
use crate::{
    CumulativeNotes, PdfBackend, PipelineError, RenderedNotes, Tier, TierTexts, aggregate,
    backend, sanitize,
};

/// One configured triage-and-render pipeline.
///
/// Built once at startup with its backend and classifier injected, then shared
/// across requests. Each [`run`](Self::run) owns its own buffers.
pub struct Pipeline {
    backend: Arc<dyn PdfBackend>,
    classifier: Arc<dyn TextClassifier>,
    max_pages: usize,
    output: OutputOptions,
}

impl Pipeline {
    pub fn new(
        backend: Arc<dyn PdfBackend>,
        classifier: Arc<dyn TextClassifier>,
        config: &Config,
    ) -> Self {
        Self {
            backend,
            classifier,
            max_pages: config.max_pages,
            output: config.output.clone(),
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn output(&self) -> &OutputOptions {
        &self.output
    }

    /// Extract raw text from the first pages of a PDF (blocking I/O via the
    /// backend, so it runs on the blocking pool).
    pub async fn extract(&self, data: Vec<u8>) -> Result<String, PipelineError> {
        let pdf_backend = Arc::clone(&self.backend);
        let max_pages = self.max_pages;
        let text = tokio::task::spawn_blocking(move || {
            backend::extract_text(pdf_backend.as_ref(), &data, max_pages)
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;
        Ok(text)
    }

    /// Extract, sanitize and classify a document.
    pub async fn classify_document(&self, data: Vec<u8>) -> Result<TierTexts, PipelineError> {
        let raw = self.extract(data).await?;
        let clean = sanitize(&raw);
        tracing::debug!(
            raw_chars = raw.len(),
            clean_chars = clean.len(),
            "text extracted"
        );
        Ok(self.classifier.classify(&clean).await)
    }

    /// Aggregate tier texts cumulatively and render the three notes
    /// concurrently.
    pub async fn render_notes(&self, texts: &TierTexts) -> RenderedNotes {
        render_all(aggregate(texts)).await
    }

    /// Full run: classify, render, persist and encode.
    ///
    /// Only an unparseable document (or a failed blocking task during
    /// extraction) is an error; everything downstream degrades into
    /// placeholder content.
    pub async fn run(&self, data: Vec<u8>) -> Result<EncodedNotes, PipelineError> {
        let started = Instant::now();
        let bytes_in = data.len();

        let texts = self.classify_document(data).await?;
        let rendered = self.render_notes(&texts).await;
        let encoded = persist_and_encode(&rendered, &self.output);

        tracing::info!(
            classifier = self.classifier.name(),
            bytes_in,
            easy_bytes = rendered.easy.len(),
            medium_bytes = rendered.medium.len(),
            hard_bytes = rendered.hard.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "notes generated"
        );
        Ok(encoded)
    }
}

async fn render_all(notes: CumulativeNotes) -> RenderedNotes {
    let spawn = |tier: Tier, content: String| {
        tokio::task::spawn_blocking(move || render_note(tier.title(), &content))
    };
    let CumulativeNotes { easy, medium, hard } = notes;
    let (easy, medium, hard) = tokio::join!(
        spawn(Tier::Easy, easy),
        spawn(Tier::Medium, medium),
        spawn(Tier::Hard, hard),
    );
    RenderedNotes {
        easy: settle(Tier::Easy, easy),
        medium: settle(Tier::Medium, medium),
        hard: settle(Tier::Hard, hard),
    }
}

fn settle(tier: Tier, joined: Result<Vec<u8>, JoinError>) -> Vec<u8> {
    joined.unwrap_or_else(|e| {
        tracing::warn!(%tier, error = %e, "render task failed, emitting error page");
        error_document(&e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::classify::delegated::mock::{MockGenerator, MockReply};
    use crate::classify::delegated::{DelegatedClassifier, fallback_texts};
    use crate::classify::heuristic::HeuristicClassifier;

    const LECTURE: &str = "This is a basic definition. Because the process connects outcomes, \
                           this is the theory framework, an advanced nuance.";

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            output: OutputOptions {
                dir: dir.to_path_buf(),
                per_request_dirs: false,
            },
            ..Config::default()
        }
    }

    fn heuristic_pipeline(pages: &[&str], dir: &std::path::Path) -> Pipeline {
        Pipeline::new(
            Arc::new(MockBackend::new(pages.iter().copied())),
            Arc::new(HeuristicClassifier::default()),
            &config_in(dir),
        )
    }

    fn is_pdf(bytes: &[u8]) -> bool {
        bytes.starts_with(b"%PDF-")
            && lopdf::Document::load_mem(bytes)
                .map(|d| !d.get_pages().is_empty())
                .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_lecture_hard_tier_holds_theory_sentence() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = heuristic_pipeline(&[LECTURE], tmp.path());
        let texts = pipeline.classify_document(b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(texts.easy, "This is a basic definition.");
        assert_eq!(texts.medium, Tier::Medium.placeholder());
        assert!(texts.hard.contains("this is the theory framework"));
    }

    #[tokio::test]
    async fn test_run_writes_and_encodes_three_pdfs() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = heuristic_pipeline(&[LECTURE], tmp.path());
        let encoded = pipeline.run(b"%PDF-1.4".to_vec()).await.unwrap();

        assert_eq!(encoded.output_dir.as_deref(), Some(tmp.path()));
        for tier in Tier::ALL {
            let bytes = std::fs::read(tmp.path().join(tier.file_name())).unwrap();
            assert!(is_pdf(&bytes), "{tier} is not a PDF");
        }
        assert!(!encoded.easy.is_empty());
        assert!(!encoded.medium.is_empty());
        assert!(!encoded.hard.is_empty());
    }

    #[tokio::test]
    async fn test_pages_joined_and_sanitized() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = heuristic_pipeline(
            &["\u{2022} This is a basic", "definition of the \u{201C}term\u{201D}."],
            tmp.path(),
        );
        let raw = pipeline.extract(b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(raw, "\u{2022} This is a basic definition of the \u{201C}term\u{201D}.");
        let texts = pipeline.classify_document(b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(texts.easy, "This is a basic definition of the \"term\".");
    }

    #[tokio::test]
    async fn test_non_pdf_fails_without_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let pipeline = heuristic_pipeline(&[LECTURE], &out);
        let err = pipeline.run(b"not a pdf at all".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::DocumentParse(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_only_easy_content_keeps_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = heuristic_pipeline(
            &["This is a basic definition. What is a simple example of a fact?"],
            tmp.path(),
        );
        let texts = pipeline.classify_document(b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(texts.medium, Tier::Medium.placeholder());
        assert_eq!(texts.hard, Tier::Hard.placeholder());

        let cumulative = aggregate(&texts);
        assert!(cumulative.medium.starts_with(&texts.easy));
        assert!(cumulative.hard.contains(&texts.easy));
        assert!(cumulative.hard.ends_with(Tier::Hard.placeholder()));
    }

    #[tokio::test]
    async fn test_delegated_failure_still_yields_three_pdfs() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::new(MockReply::Status(500)));
        let pipeline = Pipeline::new(
            Arc::new(MockBackend::new([LECTURE.repeat(3)])),
            Arc::new(DelegatedClassifier::new(generator.clone())),
            &config_in(tmp.path()),
        );

        let texts = pipeline.classify_document(b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(texts, fallback_texts());
        assert_eq!(generator.call_count(), 1);

        let rendered = pipeline.render_notes(&texts).await;
        for tier in Tier::ALL {
            assert!(is_pdf(rendered.get(tier)));
        }
    }

    #[tokio::test]
    async fn test_max_pages_limits_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.max_pages = 1;
        let pipeline = Pipeline::new(
            Arc::new(MockBackend::new(["page one", "page two"])),
            Arc::new(HeuristicClassifier::default()),
            &config,
        );
        assert_eq!(pipeline.extract(b"%PDF-1.4".to_vec()).await.unwrap(), "page one");
    }
}
