//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for inference,
//! tagging and the LLM, `AppPaths` for config/output locations, and TOML
//! persistence via `AppConfig::load_from` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, InferenceConfig, LlmConfig, TaggerConfig};
