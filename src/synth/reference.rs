//! Reference clip selection.
//!
//! Turns matcher output into the primary reference (whose transcript becomes
//! the prompt text) plus optional auxiliary references for tone fusion.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::emotion::{EmotionAnnotation, Language};

/// References and prompt for one synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    pub primary_ref: PathBuf,
    pub aux_refs: Vec<PathBuf>,
    pub prompt_text: String,
    pub prompt_language: Language,
}

impl ReferenceSet {
    /// Primary only, no auxiliary references.
    pub fn single(primary: &EmotionAnnotation) -> Self {
        Self {
            primary_ref: primary.file.clone(),
            aux_refs: Vec::new(),
            prompt_text: primary.text.clone(),
            prompt_language: primary.language,
        }
    }
}

/// Pick the references for a synthesis request from non-empty `matches`.
///
/// The first match is always the primary.  With `use_aux` the remaining
/// matches become auxiliary references, down-sampled uniformly without
/// replacement to `max_aux` when there are more.
///
/// Returns `None` only when `matches` is empty.
pub fn build_reference<R: Rng + ?Sized>(
    matches: &[&EmotionAnnotation],
    use_aux: bool,
    max_aux: usize,
    rng: &mut R,
) -> Option<ReferenceSet> {
    let (primary, rest) = matches.split_first()?;
    let mut reference = ReferenceSet::single(primary);

    if !use_aux {
        return Some(reference);
    }
    if rest.is_empty() {
        log::warn!("only one matching reference; auxiliary references unavailable");
        return Some(reference);
    }

    reference.aux_refs = if rest.len() > max_aux {
        rest.choose_multiple(rng, max_aux)
            .map(|a| a.file.clone())
            .collect()
    } else {
        rest.iter().map(|a| a.file.clone()).collect()
    };

    Some(reference)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{Emotion, Intensity};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn corpus(n: usize) -> Vec<EmotionAnnotation> {
        (0..n)
            .map(|i| EmotionAnnotation {
                file: format!("refs/clip_{i}.wav").into(),
                text: format!("prompt {i}"),
                language: if i == 0 { Language::Ko } else { Language::En },
                emotions: vec![Emotion::new("fear", Intensity::Moderate)],
            })
            .collect()
    }

    #[test]
    fn single_match_has_no_aux() {
        let corpus = corpus(1);
        let matches: Vec<_> = corpus.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let reference = build_reference(&matches, true, 3, &mut rng).unwrap();
        assert_eq!(reference.primary_ref, PathBuf::from("refs/clip_0.wav"));
        assert!(reference.aux_refs.is_empty());
        assert_eq!(reference.prompt_text, "prompt 0");
        assert_eq!(reference.prompt_language, Language::Ko);
    }

    #[test]
    fn aux_disabled_ignores_remaining_matches() {
        let corpus = corpus(4);
        let matches: Vec<_> = corpus.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let reference = build_reference(&matches, false, 3, &mut rng).unwrap();
        assert!(reference.aux_refs.is_empty());
        assert_eq!(reference.primary_ref, PathBuf::from("refs/clip_0.wav"));
    }

    #[test]
    fn aux_under_limit_keeps_all_in_order() {
        let corpus = corpus(3);
        let matches: Vec<_> = corpus.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let reference = build_reference(&matches, true, 3, &mut rng).unwrap();
        assert_eq!(
            reference.aux_refs,
            vec![
                PathBuf::from("refs/clip_1.wav"),
                PathBuf::from("refs/clip_2.wav"),
            ]
        );
    }

    #[test]
    fn aux_over_limit_is_sampled_without_replacement() {
        let corpus = corpus(6);
        let matches: Vec<_> = corpus.iter().collect();
        let remaining: HashSet<PathBuf> = corpus[1..].iter().map(|a| a.file.clone()).collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let reference = build_reference(&matches, true, 2, &mut rng).unwrap();

            assert_eq!(reference.aux_refs.len(), 2);
            assert_ne!(reference.aux_refs[0], reference.aux_refs[1]);
            assert!(reference.aux_refs.iter().all(|p| remaining.contains(p)));
            assert_eq!(reference.primary_ref, PathBuf::from("refs/clip_0.wav"));
        }
    }

    #[test]
    fn empty_matches_yield_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(build_reference(&[], true, 3, &mut rng).is_none());
    }
}
