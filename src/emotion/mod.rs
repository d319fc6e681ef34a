//! Emotion data model and reference-annotation handling.
//!
//! This module provides:
//! * [`Emotion`] / [`Intensity`]: a single emotion label (`type:intensity`).
//! * [`Language`]: the text languages accepted by the synthesis backend.
//! * [`EmotionAnnotation`]: one reference clip with its emotional content.
//! * [`EmotionVocabulary`]: the configured allow-list of emotion types.
//! * [`AnnotationStore`]: the session's working set, persisted as JSON.
//! * [`find`]: exact / nearest-neighbour matching over a store.
//! * [`DurationFilter`]: drops reference clips outside a duration window.
//!
//! # Quick start
//!
//! ```rust
//! use emotion_tts::emotion::{parse_emotions, EmotionVocabulary};
//!
//! let vocab = EmotionVocabulary::default();
//! let emotions = parse_emotions("joy:low, fear:high", &vocab).unwrap();
//! assert_eq!(emotions.len(), 2);
//! assert_eq!(emotions[1].to_string(), "fear:high");
//! ```

pub mod duration;
pub mod matcher;
pub mod store;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use duration::{audio_duration_secs, DurationFilter};
pub use matcher::{find, find_with, match_score, FallbackMode, MISSING_TYPE_PENALTY};
pub use store::AnnotationStore;

/// Emotion types understood by the ad-hoc inference prompt, and the default
/// configured vocabulary (first entry is the fallback default).
pub const BUILTIN_EMOTION_TYPES: [&str; 8] = [
    "neutral",
    "joy",
    "fear",
    "surprise",
    "sadness",
    "disgust",
    "anger",
    "confusion",
];

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Errors produced while parsing emotion, intensity or language strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Intensity was not one of `low`, `moderate`, `high`.
    #[error("invalid intensity: {0:?}")]
    Intensity(String),

    /// Language was not one of `zh`, `ja`, `en`, `ko`, `yue`.
    #[error("unsupported language: {0:?}")]
    Language(String),

    /// An emotion entry was not of the form `type:intensity`.
    #[error("malformed emotion {0:?} (expected `type:intensity`)")]
    Malformed(String),

    /// The emotion type is not in the configured vocabulary.
    #[error("unknown emotion type: {0:?}")]
    UnknownType(String),

    /// No emotion entries were given.
    #[error("no emotions given")]
    Empty,
}

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

/// How strongly an emotion is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    /// Ordinal used by nearest-neighbour scoring: `low=1, moderate=2, high=3`.
    pub fn rank(self) -> u32 {
        match self {
            Intensity::Low => 1,
            Intensity::Moderate => 2,
            Intensity::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }
}

impl FromStr for Intensity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Intensity::Low),
            "moderate" => Ok(Intensity::Moderate),
            "high" => Ok(Intensity::High),
            other => Err(ParseError::Intensity(other.to_string())),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// A single emotion label.
///
/// `kind` is open-vocabulary on purpose: whether a type is acceptable is
/// decided at call sites against an [`EmotionVocabulary`].  Serialised as
/// `{"type": ..., "intensity": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emotion {
    #[serde(rename = "type")]
    pub kind: String,
    pub intensity: Intensity,
}

impl Emotion {
    pub fn new(kind: impl Into<String>, intensity: Intensity) -> Self {
        Self {
            kind: kind.into(),
            intensity,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.intensity)
    }
}

/// Render a list of emotions as `joy:low,fear:moderate`.
pub fn emotions_to_string(emotions: &[Emotion]) -> String {
    emotions
        .iter()
        .map(Emotion::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse operator input of the form `joy:low,fear:moderate`.
///
/// Input is trimmed and lowercased.  Every type must be in `vocab`.
pub fn parse_emotions(input: &str, vocab: &EmotionVocabulary) -> Result<Vec<Emotion>, ParseError> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    input
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            let (kind, intensity) = entry
                .split_once(':')
                .ok_or_else(|| ParseError::Malformed(entry.to_string()))?;
            let kind = kind.trim();
            if !vocab.contains(kind) {
                return Err(ParseError::UnknownType(kind.to_string()));
            }
            Ok(Emotion::new(kind, intensity.trim().parse()?))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Text languages supported by the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    Ja,
    En,
    Ko,
    Yue,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Zh,
        Language::Ja,
        Language::En,
        Language::Ko,
        Language::Yue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::En => "en",
            Language::Ko => "ko",
            Language::Yue => "yue",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    /// Case-insensitive; list files usually carry upper-case codes (`ZH`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| ParseError::Language(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EmotionAnnotation
// ---------------------------------------------------------------------------

/// One reference audio clip with its ground-truth emotional content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnnotation {
    /// Path of the reference clip, as given in the source list file.
    pub file: PathBuf,
    /// Transcript of the clip; sent to the backend as the prompt text.
    pub text: String,
    pub language: Language,
    pub emotions: Vec<Emotion>,
}

// ---------------------------------------------------------------------------
// EmotionVocabulary
// ---------------------------------------------------------------------------

/// Ordered allow-list of emotion types.  The first entry is the default type
/// used whenever an emotion has to be made up.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionVocabulary {
    types: Vec<String>,
}

impl EmotionVocabulary {
    /// Build from the configured list.  An empty list falls back to the
    /// built-in types so [`default_type`](Self::default_type) always exists.
    pub fn new(types: Vec<String>) -> Self {
        if types.is_empty() {
            log::warn!("emotion_types is empty; using the built-in vocabulary");
            return Self::default();
        }
        Self { types }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }

    pub fn default_type(&self) -> &str {
        &self.types[0]
    }

    /// `neutral, joy, ...`, used in prompts and help messages.
    pub fn joined(&self) -> String {
        self.types.join(", ")
    }
}

impl Default for EmotionVocabulary {
    fn default() -> Self {
        Self {
            types: BUILTIN_EMOTION_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
