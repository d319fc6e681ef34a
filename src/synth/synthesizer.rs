//! Emotion-conditioned synthesis: match, pick references, call the backend.

use std::sync::Arc;

use thiserror::Error;

use super::client::{TtsClient, TtsError};
use super::reference::{build_reference, ReferenceSet};
use super::request::SynthesisRequest;
use crate::config::InferenceConfig;
use crate::emotion::matcher::{find_with, FallbackMode};
use crate::emotion::{emotions_to_string, AnnotationStore, Emotion, EmotionAnnotation, Language};

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("annotation store is empty; nothing to use as a reference")]
    EmptyStore,

    #[error(transparent)]
    Tts(#[from] TtsError),
}

/// Holds the annotation corpus and the backend for a synthesis session.
pub struct Synthesizer {
    store: AnnotationStore,
    tts: Arc<dyn TtsClient>,
    config: InferenceConfig,
}

impl Synthesizer {
    pub fn new(store: AnnotationStore, tts: Arc<dyn TtsClient>, config: InferenceConfig) -> Self {
        if config.legacy_fallback_match {
            log::warn!("legacy fallback matching enabled; results may include non-nearest clips");
        }
        Self { store, tts, config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Choose the references for `emotions` spoken in `language`.
    ///
    /// When language filtering leaves no candidates, the first annotation of
    /// the whole store is used alone with auxiliary references disabled.
    pub fn select_reference(
        &self,
        language: Language,
        emotions: &[Emotion],
    ) -> Result<ReferenceSet, SynthesisError> {
        let mode = if self.config.legacy_fallback_match {
            FallbackMode::Legacy
        } else {
            FallbackMode::Nearest
        };

        let filtered;
        let corpus: &[EmotionAnnotation] = if self.config.match_language {
            filtered = self.store.in_language(language);
            &filtered
        } else {
            self.store.annotations()
        };

        let matches = find_with(emotions, corpus, mode);
        let mut rng = rand::thread_rng();
        if let Some(reference) = build_reference(
            &matches,
            self.config.use_aux_ref,
            self.config.max_aux_refs,
            &mut rng,
        ) {
            log::info!(
                "matched {} clip(s) for [{}]; primary {}, {} auxiliary",
                matches.len(),
                emotions_to_string(emotions),
                reference.primary_ref.display(),
                reference.aux_refs.len()
            );
            return Ok(reference);
        }

        let fallback = self.store.first().ok_or(SynthesisError::EmptyStore)?;
        log::warn!(
            "no reference clip for [{}] in {language}; using {} without auxiliary references",
            emotions_to_string(emotions),
            fallback.file.display()
        );
        Ok(ReferenceSet::single(fallback))
    }

    /// Synthesize `text` with the voice tone of the best-matching clips.
    pub async fn generate(
        &self,
        text: &str,
        language: Language,
        emotions: &[Emotion],
    ) -> Result<Vec<u8>, SynthesisError> {
        let reference = self.select_reference(language, emotions)?;
        let request = SynthesisRequest::new(text, language, reference, &self.config);
        let audio = self.tts.synthesize(&request).await?;
        log::debug!("received {} bytes of {}", audio.len(), self.config.media_type);
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
