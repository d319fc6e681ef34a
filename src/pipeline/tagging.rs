//! One-shot tagging run: list file in, annotation JSON out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{AppConfig, AppPaths};
use crate::emotion::{AnnotationStore, DurationFilter};
use crate::llm::LlmClient;
use crate::tagger::{read_list_file, Tagger, TaggerOptions};

/// What a tagging run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggingSummary {
    pub output: PathBuf,
    /// Lines read from the list file, context lines included.
    pub lines: usize,
    /// Annotations returned by the tagger.
    pub tagged: usize,
    /// Annotations written after the duration filter.
    pub written: usize,
}

/// Tag every line of `list_file` and write the result to
/// [`AppPaths::annotation_output`].
pub async fn run_tagging(
    config: &AppConfig,
    paths: &AppPaths,
    list_file: &Path,
    llm: Arc<dyn LlmClient>,
) -> Result<TaggingSummary> {
    let lines = read_list_file(list_file)?;
    log::info!("read {} line(s) from {}", lines.len(), list_file.display());

    let tagger = Tagger::new(llm, config.vocabulary(), TaggerOptions::from(&config.tagger));
    let annotations = tagger.tag(&lines).await;
    let tagged = annotations.len();

    let annotations = if config.tagger.check_duration {
        DurationFilter::new(config.tagger.min_duration_secs, config.tagger.max_duration_secs)
            .apply(annotations)
    } else {
        annotations
    };

    let store = AnnotationStore::from_annotations(annotations);
    let output = paths.annotation_output(list_file);
    store
        .save(&output)
        .with_context(|| format!("writing annotations for {}", list_file.display()))?;

    log::info!(
        "emotion annotations have been written to {} ({} of {} kept)",
        output.display(),
        store.len(),
        tagged
    );

    Ok(TaggingSummary {
        output,
        lines: lines.len(),
        tagged,
        written: store.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Answers `sadness:moderate` for every `(identifier)` line in the prompt.
    struct LabelsAll;

    #[async_trait]
    impl LlmClient for LabelsAll {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            let (_, lines) = prompt.split_once("Lines:").unwrap_or(("", prompt));
            let map: serde_json::Map<String, serde_json::Value> = lines
                .lines()
                .filter_map(|l| l.strip_prefix('('))
                .filter_map(|l| l.split_once(')'))
                .map(|(id, _)| {
                    (
                        id.to_string(),
                        serde_json::json!([{ "type": "sadness", "intensity": "moderate" }]),
                    )
                })
                .collect();
            Ok(serde_json::Value::Object(map).to_string())
        }
    }

    fn write_wav(path: &Path, secs: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(secs * 8_000.0) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn config(check_duration: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.tagger.check_duration = check_duration;
        config.tagger.batch_size = 2;
        config.tagger.overlap = 1;
        config
    }

    #[tokio::test]
    async fn writes_annotations_next_to_list_stem() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("texas.list");
        std::fs::write(
            &list,
            "v/tx_01.wav|Texas|JA|一\nnull|null|JA|……\nv/tx_02.wav|Texas|JA|二\nv/tx_03.wav|Texas|EN|three\n",
        )
        .unwrap();
        let paths = AppPaths::with_config(dir.path().join("config.toml"), dir.path());

        let summary = run_tagging(&config(false), &paths, &list, Arc::new(LabelsAll))
            .await
            .unwrap();

        assert_eq!(
            summary.output,
            dir.path().join("outputs/emotions/texas_emotion_annotation.json")
        );
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.tagged, 3);
        assert_eq!(summary.written, 3);

        let store = AnnotationStore::load(&summary.output).unwrap();
        let files: Vec<_> = store.annotations().iter().map(|a| a.file.clone()).collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("v/tx_01.wav"),
                PathBuf::from("v/tx_02.wav"),
                PathBuf::from("v/tx_03.wav"),
            ]
        );
    }

    #[tokio::test]
    async fn duration_filter_drops_out_of_range_clips() {
        let dir = tempdir().unwrap();
        let short = dir.path().join("short.wav");
        let good = dir.path().join("good.wav");
        write_wav(&short, 1.0);
        write_wav(&good, 4.0);

        let list = dir.path().join("mixed.list");
        std::fs::write(
            &list,
            format!(
                "{}|A|ZH|短\n{}|A|ZH|好的\n{}|A|ZH|没有\n",
                short.display(),
                good.display(),
                dir.path().join("missing.wav").display()
            ),
        )
        .unwrap();
        let paths = AppPaths::with_config(dir.path().join("config.toml"), dir.path());

        let summary = run_tagging(&config(true), &paths, &list, Arc::new(LabelsAll))
            .await
            .unwrap();
        assert_eq!(summary.tagged, 3);
        assert_eq!(summary.written, 1);

        let store = AnnotationStore::load(&summary.output).unwrap();
        assert_eq!(store.annotations()[0].file, good);
    }

    #[tokio::test]
    async fn missing_list_file_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::with_config(dir.path().join("config.toml"), dir.path());
        let result = run_tagging(
            &config(false),
            &paths,
            &dir.path().join("nope.list"),
            Arc::new(LabelsAll),
        )
        .await;
        assert!(result.is_err());
    }
}
