//! The batch tagger.
//!
//! [`Tagger::tag`] cuts the input into [`BatchWindow`]s, runs every window
//! concurrently on the calling task, and merges the results once all of them
//! have settled.
//!
//! ```text
//! lines ─▶ windows() ─┬─▶ process_window(0) ─ retry ≤ N ─┐
//!                     ├─▶ process_window(1) ─ retry ≤ N ─┼─▶ join_all ─▶ merge()
//!                     └─▶ process_window(k) ─ retry ≤ N ─┘
//! ```
//!
//! A window that exhausts its attempts contributes nothing; the run goes on.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use super::batch::{merge, windows, BatchWindow};
use super::list_file::ListFileAnnotation;
use super::response::{parse_reply, ValidationError};
use crate::config::TaggerConfig;
use crate::emotion::{EmotionAnnotation, EmotionVocabulary};
use crate::llm::{LlmClient, LlmError, PromptBuilder};

/// Length of the prompt excerpt logged with each request.
const PREVIEW_CHARS: usize = 100;

/// Failure of a single window attempt.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Window geometry and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggerOptions {
    pub batch_size: usize,
    pub overlap: usize,
    /// Attempts per window; at least one attempt is always made.
    pub retry_limit: usize,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self {
            batch_size: 200,
            overlap: 20,
            retry_limit: 5,
        }
    }
}

impl From<&TaggerConfig> for TaggerOptions {
    fn from(config: &TaggerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            overlap: config.overlap,
            retry_limit: config.retry_limit,
        }
    }
}

/// Labels list-file lines with emotions through an LLM.
pub struct Tagger {
    llm: Arc<dyn LlmClient>,
    vocab: EmotionVocabulary,
    prompts: PromptBuilder,
    options: TaggerOptions,
}

impl Tagger {
    pub fn new(llm: Arc<dyn LlmClient>, vocab: EmotionVocabulary, options: TaggerOptions) -> Self {
        let prompts = PromptBuilder::new(&vocab);
        Self {
            llm,
            vocab,
            prompts,
            options,
        }
    }

    /// Tag `lines`, returning annotations deduplicated by file in window
    /// order.  Never fails as a whole: broken windows are logged and skipped.
    pub async fn tag(&self, lines: &[ListFileAnnotation]) -> Vec<EmotionAnnotation> {
        let windows = windows(lines, self.options.batch_size, self.options.overlap);
        log::info!(
            "tagging {} lines in {} batch(es) of {} (+{} overlap)",
            lines.len(),
            windows.len(),
            self.options.batch_size,
            self.options.overlap
        );

        let results = join_all(windows.iter().map(|w| self.process_window(w))).await;

        let failed = results.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            log::error!("{failed}/{} batch(es) produced no annotations", windows.len());
        }

        let merged = merge(results.into_iter().map(Option::unwrap_or_default).collect());
        log::info!("tagged {} file(s)", merged.len());
        merged
    }

    /// Run one window with retries.  `None` when every attempt failed.
    async fn process_window(&self, window: &BatchWindow<'_>) -> Option<Vec<EmotionAnnotation>> {
        let prompt = self.prompts.build_tagging(&window.prompt_lines());
        let attempts = self.options.retry_limit.max(1);

        for attempt in 1..=attempts {
            match self.request(window, &prompt).await {
                Ok(annotations) => return Some(annotations),
                Err(e) => log::warn!(
                    "batch at line {}: attempt {attempt}/{attempts} failed: {e}",
                    window.start
                ),
            }
        }

        log::error!(
            "failed to process batch starting with line: {}",
            window.first_text()
        );
        log::debug!("prompt: {prompt}");
        None
    }

    /// A single tagging request for `window`, without retries.
    pub async fn tag_window(
        &self,
        window: &BatchWindow<'_>,
    ) -> Result<Vec<EmotionAnnotation>, BatchError> {
        let prompt = self.prompts.build_tagging(&window.prompt_lines());
        self.request(window, &prompt).await
    }

    async fn request(
        &self,
        window: &BatchWindow<'_>,
        prompt: &str,
    ) -> Result<Vec<EmotionAnnotation>, BatchError> {
        let range = window.range();
        let preview: String = window
            .prompt_lines()
            .join(" / ")
            .chars()
            .take(PREVIEW_CHARS)
            .collect();
        log::info!("requesting LLM for lines {}..{}: {preview}...", range.start, range.end);

        let reply = self.llm.complete(prompt).await?;
        Ok(parse_reply(&reply, window, &self.vocab)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{Intensity, Language};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Identifiers of the `(stem)` lines in a tagging prompt.
    fn prompt_identifiers(prompt: &str) -> Vec<String> {
        let (_, lines) = prompt.split_once("Lines:").expect("tagging prompt");
        lines
            .lines()
            .filter_map(|l| l.strip_prefix('('))
            .filter_map(|l| l.split_once(')'))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn labels_for(ids: &[String], intensity: &str) -> String {
        let map: serde_json::Map<String, serde_json::Value> = ids
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    serde_json::json!([{ "type": "joy", "intensity": intensity }]),
                )
            })
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    /// Labels every identifier; the first window answers `low`, the others
    /// `high`, so results can be traced back to their window.
    struct LabelsAll;

    #[async_trait]
    impl LlmClient for LabelsAll {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            let ids = prompt_identifiers(prompt);
            let intensity = if ids.first().is_some_and(|id| id == "line_000") {
                "low"
            } else {
                "high"
            };
            Ok(format!("```json\n{}\n```", labels_for(&ids, intensity)))
        }
    }

    /// Fails every request whose prompt contains `poison`; counts calls.
    struct FailsOn {
        poison: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FailsOn {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains(self.poison) {
                return Err(LlmError::Request("connection reset".into()));
            }
            Ok(labels_for(&prompt_identifiers(prompt), "moderate"))
        }
    }

    /// Replies with garbage for the first `failures` calls.
    struct FlakyThenOk {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FlakyThenOk {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Ok("{\"oops\": ".into());
            }
            Ok(labels_for(&prompt_identifiers(prompt), "low"))
        }
    }

    /// Omits the last required identifier from every reply.
    struct DropsLast;

    #[async_trait]
    impl LlmClient for DropsLast {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            let mut ids = prompt_identifiers(prompt);
            ids.pop();
            Ok(labels_for(&ids, "low"))
        }
    }

    fn lines(n: usize) -> Vec<ListFileAnnotation> {
        (0..n)
            .map(|i| ListFileAnnotation {
                path: Some(format!("clips/line_{i:03}.wav").into()),
                speaker: Some("Exusiai".into()),
                language: Language::Zh,
                text: format!("text {i}"),
            })
            .collect()
    }

    fn tagger(llm: Arc<dyn LlmClient>, batch_size: usize, overlap: usize, retry_limit: usize) -> Tagger {
        Tagger::new(
            llm,
            EmotionVocabulary::default(),
            TaggerOptions {
                batch_size,
                overlap,
                retry_limit,
            },
        )
    }

    fn files(annotations: &[EmotionAnnotation]) -> Vec<String> {
        annotations
            .iter()
            .map(|a| a.file.display().to_string())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn overlapping_file_is_emitted_once_from_earlier_window() {
        let input = lines(5);
        let result = tagger(Arc::new(LabelsAll), 2, 1, 3).tag(&input).await;

        assert_eq!(
            files(&result),
            (0..5)
                .map(|i| format!("clips/line_{i:03}.wav"))
                .collect::<Vec<_>>()
        );
        // line_002 is window 0's overlap tail and window 1's first line.
        assert_eq!(result[2].emotions[0].intensity, Intensity::Low);
        assert_eq!(result[3].emotions[0].intensity, Intensity::High);
    }

    #[tokio::test]
    async fn exhausted_window_contributes_nothing() {
        let input = lines(6);
        let llm = Arc::new(FailsOn {
            poison: "(line_002)",
            calls: AtomicUsize::new(0),
        });
        let result = tagger(llm.clone(), 2, 0, 3).tag(&input).await;

        assert_eq!(
            files(&result),
            vec![
                "clips/line_000.wav",
                "clips/line_001.wav",
                "clips/line_004.wav",
                "clips/line_005.wav",
            ]
        );
        // Two good windows once each, the poisoned one three times.
        assert_eq!(llm.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn retries_until_reply_validates() {
        let input = lines(3);
        let llm = Arc::new(FlakyThenOk {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let result = tagger(llm.clone(), 200, 20, 5).tag(&input).await;

        assert_eq!(result.len(), 3);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_identifier_exhausts_retries() {
        let input = lines(3);
        let result = tagger(Arc::new(DropsLast), 200, 20, 2).tag(&input).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn missing_overlap_identifier_is_tolerated() {
        // Window 0 covers lines 0..3 but only 0..2 are required, so dropping
        // line_002 is fine there.  Window 1 holds only line_002 and fails.
        let input = lines(3);
        let result = tagger(Arc::new(DropsLast), 2, 1, 1).tag(&input).await;
        assert_eq!(
            files(&result),
            vec!["clips/line_000.wav", "clips/line_001.wav"]
        );
    }

    #[tokio::test]
    async fn context_lines_are_never_labelled() {
        let mut input = lines(2);
        input.insert(
            1,
            ListFileAnnotation {
                path: None,
                speaker: Some("Narrator".into()),
                language: Language::Zh,
                text: "Rain began to fall.".into(),
            },
        );
        let result = tagger(Arc::new(LabelsAll), 200, 20, 1).tag(&input).await;
        assert_eq!(
            files(&result),
            vec!["clips/line_000.wav", "clips/line_001.wav"]
        );
    }

    #[tokio::test]
    async fn tag_window_surfaces_errors() {
        let input = lines(2);
        let t = tagger(
            Arc::new(FailsOn {
                poison: "(line_000)",
                calls: AtomicUsize::new(0),
            }),
            200,
            20,
            5,
        );
        let window = windows(&input, 200, 20)[0];
        assert!(matches!(
            t.tag_window(&window).await,
            Err(BatchError::Llm(LlmError::Request(_)))
        ));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let llm = Arc::new(FailsOn {
            poison: "never",
            calls: AtomicUsize::new(0),
        });
        let result = tagger(llm.clone(), 200, 20, 5).tag(&[]).await;
        assert!(result.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
