//! Ad-hoc emotion inference for a single utterance.
//!
//! [`EmotionInferer::infer`] never fails: when the LLM call or its output is
//! unusable it logs a warning and returns `[<default type>:low]`, where the
//! default type is the first entry of the configured vocabulary.  Callers that
//! want to see the failure use [`EmotionInferer::try_infer`].

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::emotion::{Emotion, EmotionVocabulary, Intensity, BUILTIN_EMOTION_TYPES};
use crate::llm::client::{LlmClient, LlmError};
use crate::llm::prompt::{strip_code_fence, PromptBuilder};

/// Why inference fell back to the default emotion.
#[derive(Debug, Error)]
pub enum InferError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("LLM reply is not a JSON array of emotions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Infers target emotions for text typed by the operator.
pub struct EmotionInferer {
    llm: Arc<dyn LlmClient>,
    vocab: EmotionVocabulary,
    prompts: PromptBuilder,
}

impl EmotionInferer {
    pub fn new(llm: Arc<dyn LlmClient>, vocab: EmotionVocabulary) -> Self {
        let prompts = PromptBuilder::new(&vocab);
        Self { llm, vocab, prompts }
    }

    /// Infer emotions for `text`; always returns at least one emotion.
    pub async fn infer(&self, text: &str) -> Vec<Emotion> {
        match self.try_infer(text).await {
            Ok(emotions) => emotions,
            Err(e) => {
                let fallback = Emotion::new(self.vocab.default_type(), Intensity::Low);
                log::warn!("emotion inference failed ({e}); using default emotion {fallback}");
                vec![fallback]
            }
        }
    }

    /// Like [`infer`](Self::infer) but surfaces transport and parse failures.
    ///
    /// Entries whose type is not one of the built-in types or whose intensity
    /// is invalid are dropped; if none survive the result is `[neutral:low]`.
    pub async fn try_infer(&self, text: &str) -> Result<Vec<Emotion>, InferError> {
        let reply = self.llm.complete(&self.prompts.build_inference(text)).await?;
        // Only the array itself is mandatory; each entry is checked on its own.
        let raw: Vec<Value> = serde_json::from_str(&strip_code_fence(&reply))?;

        let emotions: Vec<Emotion> = raw.iter().filter_map(builtin_emotion).collect();

        if emotions.is_empty() {
            log::warn!("no usable emotion in LLM reply; using neutral:low");
            return Ok(vec![Emotion::new("neutral", Intensity::Low)]);
        }

        Ok(emotions)
    }
}

/// `{type, intensity}` with a built-in type and a valid intensity, or `None`.
fn builtin_emotion(entry: &Value) -> Option<Emotion> {
    let kind = entry.get("type").and_then(Value::as_str)?;
    if !BUILTIN_EMOTION_TYPES.contains(&kind) {
        return None;
    }
    let intensity = entry
        .get("intensity")
        .and_then(Value::as_str)?
        .parse::<Intensity>()
        .ok()?;
    Some(Emotion::new(kind, intensity))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
