//! In-memory working set of [`EmotionAnnotation`]s with JSON persistence.
//!
//! The on-disk format is a JSON array of
//! `{file, text, language, emotions: [{type, intensity}]}` objects, written
//! with 4-space indentation and non-ASCII text kept as-is.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{EmotionAnnotation, Language};

/// Owns the emotion annotations of one tagging or inference session.
///
/// The store is filled once (by the tagger or from a JSON file) and then only
/// read; the matcher borrows [`annotations`](Self::annotations).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: Vec<EmotionAnnotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_annotations(annotations: Vec<EmotionAnnotation>) -> Self {
        Self { annotations }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load a store from an annotation JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read annotations from {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let annotations: Vec<EmotionAnnotation> = serde_json::from_str(data)?;
        Ok(Self { annotations })
    }

    /// Serialise with 4-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(256 * self.annotations.len().max(1));
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.annotations.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write the store to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("write annotations to {}", path.display()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn annotations(&self) -> &[EmotionAnnotation] {
        &self.annotations
    }

    pub fn first(&self) -> Option<&EmotionAnnotation> {
        self.annotations.first()
    }

    /// Annotations whose clip is in `language`, in store order.
    pub fn in_language(&self, language: Language) -> Vec<EmotionAnnotation> {
        self.annotations
            .iter()
            .filter(|a| a.language == language)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn into_annotations(self) -> Vec<EmotionAnnotation> {
        self.annotations
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
