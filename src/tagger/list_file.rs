//! GPT-SoVITS list-file parsing.
//!
//! One record per line, four `|`-separated fields:
//!
//! ```text
//! path|speaker|language|text
//! ```
//!
//! `path` and `speaker` may be the literal `null`, which marks a context-only
//! line (narration, a line without audio).  The sentinel becomes `None` here
//! and never travels further as a string.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::emotion::{Language, ParseError};

const NULL_SENTINEL: &str = "null";

/// Errors raised while reading a list file.
#[derive(Debug, Error)]
pub enum ListFileError {
    #[error("cannot read list file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `path|speaker|language|text`, got {content:?}")]
    FieldCount { line: usize, content: String },

    #[error("line {line}: {source}")]
    Language {
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// One input record of the tagger.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFileAnnotation {
    /// Audio clip; `None` for context-only lines that never get labels.
    pub path: Option<PathBuf>,
    pub speaker: Option<String>,
    pub language: Language,
    pub text: String,
}

impl ListFileAnnotation {
    /// File-name stem of `path`: the key the LLM must answer under.
    pub fn identifier(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// How the line is presented to the LLM.
    ///
    /// | path | speaker | format |
    /// |------|---------|--------|
    /// | –    | –       | `text` |
    /// | –    | ✓       | `speaker: text` |
    /// | ✓    | –       | `(stem) text` |
    /// | ✓    | ✓       | `(stem)speaker: text` |
    pub fn prompt_line(&self) -> String {
        match (self.identifier(), self.speaker.as_deref()) {
            (None, None) => self.text.clone(),
            (None, Some(speaker)) => format!("{speaker}: {}", self.text),
            (Some(stem), None) => format!("({stem}) {}", self.text),
            (Some(stem), Some(speaker)) => format!("({stem}){speaker}: {}", self.text),
        }
    }
}

fn optional(field: &str) -> Option<&str> {
    let field = field.trim();
    (field != NULL_SENTINEL).then_some(field)
}

/// Parse list-file content.  Blank lines are skipped; line numbers in errors
/// are 1-based.
pub fn parse_list(content: &str) -> Result<Vec<ListFileAnnotation>, ListFileError> {
    let mut annotations = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Only the first three separators split; the text may contain `|`.
        let fields: Vec<&str> = trimmed.splitn(4, '|').collect();
        let &[path, speaker, language, text] = fields.as_slice() else {
            return Err(ListFileError::FieldCount {
                line: line_no,
                content: trimmed.to_string(),
            });
        };

        let language = language
            .parse::<Language>()
            .map_err(|source| ListFileError::Language {
                line: line_no,
                source,
            })?;

        annotations.push(ListFileAnnotation {
            path: optional(path).map(PathBuf::from),
            speaker: optional(speaker).map(str::to_string),
            language,
            text: text.trim().to_string(),
        });
    }

    Ok(annotations)
}

/// Read and parse a list file from disk.
pub fn read_list_file(path: &Path) -> Result<Vec<ListFileAnnotation>, ListFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ListFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_list(&content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
