//! Reference clip duration check.
//!
//! GPT-SoVITS only accepts reference audio between 3 and 10 seconds, so
//! tagged annotations are filtered on the clip's duration before they are
//! written out.  Duration is read from the WAV header (frames / sample rate)
//! without decoding samples.

use std::path::Path;

use thiserror::Error;

use super::EmotionAnnotation;

/// Failure to determine a clip's duration.
#[derive(Debug, Error)]
pub enum DurationError {
    #[error("cannot read audio header of {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("{0} reports a sample rate of 0")]
    ZeroSampleRate(String),
}

/// Duration of the WAV file at `path` in seconds.
pub fn audio_duration_secs(path: &Path) -> Result<f64, DurationError> {
    let reader = hound::WavReader::open(path).map_err(|source| DurationError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(DurationError::ZeroSampleRate(path.display().to_string()));
    }
    // `duration()` is the frame count (samples per channel).
    Ok(f64::from(reader.duration()) / f64::from(sample_rate))
}

/// Keeps annotations whose clip duration lies in `[min_secs, max_secs]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationFilter {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for DurationFilter {
    fn default() -> Self {
        Self {
            min_secs: 3.0,
            max_secs: 10.0,
        }
    }
}

impl DurationFilter {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// `true` when the clip is readable and within bounds (inclusive).
    pub fn accepts(&self, annotation: &EmotionAnnotation) -> bool {
        match audio_duration_secs(&annotation.file) {
            Ok(secs) => {
                let keep = self.min_secs <= secs && secs <= self.max_secs;
                if !keep {
                    log::debug!(
                        "dropping {} ({secs:.2}s outside [{}, {}])",
                        annotation.file.display(),
                        self.min_secs,
                        self.max_secs
                    );
                }
                keep
            }
            Err(e) => {
                log::warn!("dropping {}: {e}", annotation.file.display());
                false
            }
        }
    }

    pub fn apply(&self, annotations: Vec<EmotionAnnotation>) -> Vec<EmotionAnnotation> {
        let before = annotations.len();
        let kept: Vec<_> = annotations.into_iter().filter(|a| self.accepts(a)).collect();
        log::info!(
            "duration check kept {}/{} annotations",
            kept.len(),
            before
        );
        kept
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{Emotion, Intensity, Language};
    use std::path::PathBuf;
    use tempfile::tempdir;

    const RATE: u32 = 32_000;

    fn write_wav(path: &Path, frames: u32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for _ in 0..frames * u32::from(channels) {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    fn annotation(file: PathBuf) -> EmotionAnnotation {
        EmotionAnnotation {
            file,
            text: "テスト".into(),
            language: Language::Ja,
            emotions: vec![Emotion::new("neutral", Intensity::Low)],
        }
    }

    #[test]
    fn duration_uses_frames_not_samples() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("stereo.wav");
        write_wav(&path, RATE * 2, 2);

        let secs = audio_duration_secs(&path).unwrap();
        assert!((secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let dir = tempdir().expect("temp dir");
        let short = dir.path().join("short.wav");
        let lower = dir.path().join("lower.wav");
        let upper = dir.path().join("upper.wav");
        let long = dir.path().join("long.wav");
        write_wav(&short, RATE * 29 / 10, 1);
        write_wav(&lower, RATE * 3, 1);
        write_wav(&upper, RATE * 10, 1);
        write_wav(&long, RATE * 10 + 1, 1);

        let kept = DurationFilter::default().apply(vec![
            annotation(short),
            annotation(lower.clone()),
            annotation(upper.clone()),
            annotation(long),
        ]);

        let files: Vec<_> = kept.into_iter().map(|a| a.file).collect();
        assert_eq!(files, vec![lower, upper]);
    }

    #[test]
    fn unreadable_clip_is_dropped() {
        let dir = tempdir().expect("temp dir");
        let bogus = dir.path().join("bogus.wav");
        std::fs::write(&bogus, b"not a wav").unwrap();
        let missing = dir.path().join("missing.wav");

        let filter = DurationFilter::default();
        assert!(!filter.accepts(&annotation(bogus)));
        assert!(!filter.accepts(&annotation(missing)));
    }
}
