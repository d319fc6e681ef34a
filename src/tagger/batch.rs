//! Batch windows and result merging.
//!
//! Input lines are cut into windows that start every `batch_size` lines and
//! extend `overlap` lines into the next batch:
//!
//! ```text
//! lines:    0 ........ 199 200 ... 219 220 ........ 399 400 ...
//! window 0: [0 ............................ 219]
//! window 1:               [200 ....................... 419]
//! ```
//!
//! Only the first `batch_size` lines of a window must be labelled.  The tail
//! is margin against a truncated reply; labels the model does give for it are
//! kept, and [`merge`] resolves the resulting duplicates in favour of the
//! earlier window.

use std::collections::HashSet;

use super::list_file::ListFileAnnotation;
use crate::emotion::EmotionAnnotation;

/// A contiguous slice of input lines sent as one LLM request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchWindow<'a> {
    /// Index of the first line within the whole input.
    pub start: usize,
    /// Lines of the window, overlap tail included.
    pub lines: &'a [ListFileAnnotation],
    /// Number of leading lines whose labels are mandatory.
    pub required: usize,
}

impl<'a> BatchWindow<'a> {
    pub fn required_lines(&self) -> &'a [ListFileAnnotation] {
        &self.lines[..self.required]
    }

    pub fn overlap_lines(&self) -> &'a [ListFileAnnotation] {
        &self.lines[self.required..]
    }

    /// Text of the first line, used to name the window in diagnostics.
    pub fn first_text(&self) -> &'a str {
        self.lines.first().map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Half-open range of input line indices covered by this window.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.lines.len()
    }

    pub fn prompt_lines(&self) -> Vec<String> {
        self.lines.iter().map(ListFileAnnotation::prompt_line).collect()
    }

    /// Identifiers shared by more than one line of the window, in first-seen
    /// order.  Such lines all read the same key from the reply.
    pub fn duplicate_identifiers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in self.lines.iter().filter_map(ListFileAnnotation::identifier) {
            if !seen.insert(id.clone()) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }
}

/// Cut `lines` into overlapping windows.  A `batch_size` of 0 is treated as 1.
pub fn windows(
    lines: &[ListFileAnnotation],
    batch_size: usize,
    overlap: usize,
) -> Vec<BatchWindow<'_>> {
    let batch_size = batch_size.max(1);

    (0..lines.len())
        .step_by(batch_size)
        .map(|start| {
            let end = (start + batch_size + overlap).min(lines.len());
            let window = &lines[start..end];
            BatchWindow {
                start,
                lines: window,
                required: batch_size.min(window.len()),
            }
        })
        .collect()
}

/// Concatenate per-window results in window order, keeping the first
/// annotation seen for each file.
pub fn merge(results: Vec<Vec<EmotionAnnotation>>) -> Vec<EmotionAnnotation> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .flatten()
        .filter(|annotation| seen.insert(annotation.file.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
