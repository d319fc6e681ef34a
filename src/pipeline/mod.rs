//! The two end-to-end drivers.
//!
//! ```text
//! tag:   list file ─▶ Tagger (LLM, windows joined) ─▶ DurationFilter ─▶ JSON
//!
//! infer: JSON ─▶ AnnotationStore
//!          └─▶ loop { Text / Emotions (or LLM) / Language
//!                      ─▶ Synthesizer (matcher ─▶ references ─▶ /tts)
//!                      ─▶ outputs/audios/{ts}_{emotions}.{media_type} }
//! ```

pub mod interactive;
pub mod tagging;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use interactive::{
    load_store, output_audio_path, parse_emotion_input, parse_language_input, parse_text_input,
    InteractiveSession, UserInputError,
};
pub use tagging::{run_tagging, TaggingSummary};
