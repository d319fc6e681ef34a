//! Speech synthesis conditioned on emotion labels.
//!
//! This module provides:
//! * [`build_reference`] / [`ReferenceSet`]: primary and auxiliary clips.
//! * [`SynthesisRequest`]: the `/tts` request body.
//! * [`TtsClient`] / [`ApiTtsClient`]: the synthesis backend.
//! * [`Synthesizer`]: matcher, selector and backend wired together.

pub mod client;
pub mod reference;
pub mod request;
pub mod synthesizer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiTtsClient, TtsClient, TtsError};
pub use reference::{build_reference, ReferenceSet};
pub use request::SynthesisRequest;
pub use synthesizer::{SynthesisError, Synthesizer};
