//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every field is optional
//! in the file (`#[serde(default)]`); missing keys take the defaults below.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::emotion::{EmotionVocabulary, BUILTIN_EMOTION_TYPES};

// ---------------------------------------------------------------------------
// InferenceConfig
// ---------------------------------------------------------------------------

/// Settings for reference selection and the GPT-SoVITS `/tts` request.
///
/// The generation parameters are forwarded verbatim in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the synthesis API (e.g. `http://127.0.0.1:9880`).
    pub base_url: String,
    /// Blend tone from several matching reference clips.
    pub use_aux_ref: bool,
    /// Upper bound on auxiliary references; extra matches are sampled down.
    pub max_aux_refs: usize,
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    /// `cut0` (no split) … `cut5` (split on punctuation).
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
    /// Audio container requested from the backend; also the output extension.
    pub media_type: String,
    /// Maximum seconds to wait for a synthesis response.
    pub timeout_secs: u64,
    /// Reproduce the historical fallback-match accumulation instead of the
    /// true nearest set.
    pub legacy_fallback_match: bool,
    /// Only consider reference clips in the same language as the text.
    pub match_language: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9880".into(),
            use_aux_ref: true,
            max_aux_refs: 3,
            top_k: 15,
            top_p: 1.0,
            temperature: 1.0,
            text_split_method: "cut0".into(),
            batch_size: 1,
            batch_threshold: 0.75,
            split_bucket: true,
            speed_factor: 1.0,
            fragment_interval: 0.3,
            streaming_mode: false,
            seed: -1,
            parallel_infer: true,
            repetition_penalty: 1.35,
            media_type: "wav".into(),
            timeout_secs: 120,
            legacy_fallback_match: false,
            match_language: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TaggerConfig
// ---------------------------------------------------------------------------

/// Settings for batch emotion tagging of list files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Drop annotations whose clip is outside the duration window.
    pub check_duration: bool,
    /// Lines whose labels are required from each LLM request.
    pub batch_size: usize,
    /// Extra trailing lines sent with each batch as truncation margin.
    pub overlap: usize,
    /// Attempts per batch window before it is given up.
    pub retry_limit: usize,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            check_duration: true,
            batch_size: 200,
            overlap: 20,
            retry_limit: 5,
            min_duration_secs: 3.0,
            max_duration_secs: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the LLM used by tagging and ad-hoc inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API, up to but excluding
    /// `/chat/completions`.
    ///
    /// - Gemini: `https://generativelanguage.googleapis.com/v1beta/openai`
    /// - OpenAI: `https://api.openai.com/v1`
    /// - Ollama: `http://localhost:11434/v1`
    pub base_url: String,
    /// Model identifier sent to the API.
    pub model: String,
    /// API key; `None` for local providers.
    pub api_key: Option<String>,
    /// HTTP(S) proxy URL applied to this client only.
    pub proxy: Option<String>,
    pub temperature: f32,
    /// Maximum seconds to wait for an LLM response.  Batch requests are large,
    /// so this is generous.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            model: "gemini-1.5-flash".into(),
            api_key: None,
            proxy: None,
            temperature: 0.7,
            timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `config.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use emotion_tts::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("{}", config.inference.base_url);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    /// Emotion type vocabulary; the first entry is the fallback default.
    pub emotion_types: Vec<String>,
    pub inference: InferenceConfig,
    pub tagger: TaggerConfig,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            emotion_types: BUILTIN_EMOTION_TYPES.iter().map(|s| s.to_string()).collect(),
            inference: InferenceConfig::default(),
            tagger: TaggerConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location (see [`AppPaths`]).
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured emotion vocabulary.
    pub fn vocabulary(&self) -> EmotionVocabulary {
        EmotionVocabulary::new(self.emotion_types.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
