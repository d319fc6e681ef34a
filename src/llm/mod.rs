//! LLM access for emotion tagging and inference.
//!
//! This module provides:
//! * [`LlmClient`]: async trait implemented by all LLM backends.
//! * [`ApiClient`]: OpenAI-compatible REST client (proxy-aware).
//! * [`PromptBuilder`]: tagging and inference prompts.
//! * [`EmotionInferer`]: single-utterance inference that never fails.
//! * [`LlmError`] / [`InferError`]: error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use emotion_tts::config::AppConfig;
//! use emotion_tts::llm::{ApiClient, EmotionInferer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let llm = Arc::new(ApiClient::from_config(&config.llm)?);
//!
//!     let inferer = EmotionInferer::new(llm, config.vocabulary());
//!     let emotions = inferer.infer("I can't believe you did that!").await;
//!     println!("{emotions:?}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod inferer;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiClient, LlmClient, LlmError};
pub use inferer::{EmotionInferer, InferError};
pub use prompt::{strip_code_fence, PromptBuilder};
