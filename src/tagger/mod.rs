//! Batch emotion tagging of list files.
//!
//! This module provides:
//! * [`read_list_file`] / [`ListFileAnnotation`]: parsed input lines.
//! * [`windows`] / [`BatchWindow`]: overlapping request windows.
//! * [`parse_reply`] / [`ValidationError`]: strict reply validation.
//! * [`Tagger`]: concurrent, retrying batch tagger.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use emotion_tts::config::AppConfig;
//! use emotion_tts::llm::ApiClient;
//! use emotion_tts::tagger::{read_list_file, Tagger, TaggerOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let llm = Arc::new(ApiClient::from_config(&config.llm)?);
//!     let tagger = Tagger::new(llm, config.vocabulary(), TaggerOptions::from(&config.tagger));
//!
//!     let lines = read_list_file(Path::new("amiya.list"))?;
//!     let annotations = tagger.tag(&lines).await;
//!     println!("{} annotations", annotations.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod engine;
pub mod list_file;
pub mod response;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use batch::{merge, windows, BatchWindow};
pub use engine::{BatchError, Tagger, TaggerOptions};
pub use list_file::{parse_list, read_list_file, ListFileAnnotation, ListFileError};
pub use response::{parse_reply, ValidationError};
