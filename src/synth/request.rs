//! JSON body of a GPT-SoVITS `/tts` request.

use std::path::PathBuf;

use serde::Serialize;

use super::reference::ReferenceSet;
use crate::config::InferenceConfig;
use crate::emotion::Language;

/// Everything the backend needs for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub text_lang: Language,
    pub ref_audio_path: PathBuf,
    pub aux_ref_audio_paths: Vec<PathBuf>,
    pub prompt_text: String,
    pub prompt_lang: Language,
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    pub text_split_method: String,
    pub batch_size: u32,
    pub batch_threshold: f32,
    pub split_bucket: bool,
    pub speed_factor: f32,
    pub fragment_interval: f32,
    pub streaming_mode: bool,
    pub seed: i64,
    pub parallel_infer: bool,
    pub repetition_penalty: f32,
    pub media_type: String,
}

impl SynthesisRequest {
    /// Combine the text to speak, the chosen references and the generation
    /// parameters.  Auxiliary references are only sent when `use_aux_ref` is
    /// on.
    pub fn new(
        text: &str,
        text_lang: Language,
        reference: ReferenceSet,
        params: &InferenceConfig,
    ) -> Self {
        let aux_ref_audio_paths = if params.use_aux_ref {
            reference.aux_refs
        } else {
            Vec::new()
        };

        Self {
            text: text.to_string(),
            text_lang,
            ref_audio_path: reference.primary_ref,
            aux_ref_audio_paths,
            prompt_text: reference.prompt_text,
            prompt_lang: reference.prompt_language,
            top_k: params.top_k,
            top_p: params.top_p,
            temperature: params.temperature,
            text_split_method: params.text_split_method.clone(),
            batch_size: params.batch_size,
            batch_threshold: params.batch_threshold,
            split_bucket: params.split_bucket,
            speed_factor: params.speed_factor,
            fragment_interval: params.fragment_interval,
            streaming_mode: params.streaming_mode,
            seed: params.seed,
            parallel_infer: params.parallel_infer,
            repetition_penalty: params.repetition_penalty,
            media_type: params.media_type.clone(),
        }
    }
}
