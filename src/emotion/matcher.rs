//! Emotion matching over a corpus of reference annotations.
//!
//! [`find`] runs two passes:
//!
//! 1. **Exact**: annotations whose emotion set equals the target (same
//!    cardinality, pairwise equal after a stable sort by type).  All exact
//!    matches are returned in corpus order.
//! 2. **Fallback**: only when nothing matches exactly.  Each annotation gets
//!    a [`match_score`] and the lowest-scoring annotations win.
//!
//! The historical fallback accumulated a running list that also kept
//! non-improving annotations seen after the current minimum.  That behaviour
//! is still available as [`FallbackMode::Legacy`]; [`FallbackMode::Nearest`]
//! returns exactly the annotations tied for the true minimum.

use super::{Emotion, EmotionAnnotation};

/// Score added for a target emotion type that the annotation lacks entirely.
pub const MISSING_TYPE_PENALTY: u32 = 10;

/// How the fallback pass picks its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Every annotation whose score equals the minimum over the corpus.
    #[default]
    Nearest,
    /// Running-minimum accumulation: a strictly lower score resets the list to
    /// that annotation, anything else is appended.
    Legacy,
}

/// Find the best-matching annotations for `target` using
/// [`FallbackMode::Nearest`].
///
/// Never empty when `corpus` is non-empty.
pub fn find<'a>(target: &[Emotion], corpus: &'a [EmotionAnnotation]) -> Vec<&'a EmotionAnnotation> {
    find_with(target, corpus, FallbackMode::Nearest)
}

/// [`find`] with an explicit fallback mode.
pub fn find_with<'a>(
    target: &[Emotion],
    corpus: &'a [EmotionAnnotation],
    mode: FallbackMode,
) -> Vec<&'a EmotionAnnotation> {
    let exact: Vec<_> = corpus
        .iter()
        .filter(|a| equal_emotions(&a.emotions, target))
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    match mode {
        FallbackMode::Nearest => nearest(target, corpus),
        FallbackMode::Legacy => legacy_nearest(target, corpus),
    }
}

/// Cumulative distance of `candidate` from `target`; lower is better.
///
/// For every target emotion the *first* candidate emotion of the same type
/// contributes the absolute difference of intensity ranks; a missing type
/// contributes [`MISSING_TYPE_PENALTY`].
pub fn match_score(target: &[Emotion], candidate: &[Emotion]) -> u32 {
    target
        .iter()
        .map(|wanted| {
            candidate
                .iter()
                .find(|e| e.kind == wanted.kind)
                .map(|found| found.intensity.rank().abs_diff(wanted.intensity.rank()))
                .unwrap_or(MISSING_TYPE_PENALTY)
        })
        .sum()
}

fn equal_emotions(a: &[Emotion], b: &[Emotion]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    sorted_by_type(a)
        .into_iter()
        .zip(sorted_by_type(b))
        .all(|(x, y)| x == y)
}

/// Stable: entries sharing a type keep their original relative order.
fn sorted_by_type(emotions: &[Emotion]) -> Vec<&Emotion> {
    let mut sorted: Vec<&Emotion> = emotions.iter().collect();
    sorted.sort_by(|x, y| x.kind.cmp(&y.kind));
    sorted
}

fn nearest<'a>(target: &[Emotion], corpus: &'a [EmotionAnnotation]) -> Vec<&'a EmotionAnnotation> {
    let scores: Vec<u32> = corpus
        .iter()
        .map(|a| match_score(target, &a.emotions))
        .collect();
    let Some(&best) = scores.iter().min() else {
        return Vec::new();
    };

    corpus
        .iter()
        .zip(scores)
        .filter(|(_, score)| *score == best)
        .map(|(a, _)| a)
        .collect()
}

fn legacy_nearest<'a>(
    target: &[Emotion],
    corpus: &'a [EmotionAnnotation],
) -> Vec<&'a EmotionAnnotation> {
    let mut best_score = u32::MAX;
    let mut best = Vec::new();

    for annotation in corpus {
        let score = match_score(target, &annotation.emotions);
        if score < best_score {
            best_score = score;
            best = vec![annotation];
        } else {
            best.push(annotation);
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
