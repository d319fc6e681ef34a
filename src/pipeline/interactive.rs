//! Interactive synthesis loop.
//!
//! Each round asks for the text, the target emotions and the language, then
//! writes the synthesized clip to `outputs/audios/`.  Invalid emotions or
//! languages are re-prompted with a help message; a backend timeout or
//! rejection is reported and the next round starts.  End of input ends the
//! session.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::emotion::{
    emotions_to_string, parse_emotions, AnnotationStore, Emotion, EmotionVocabulary, Language,
    ParseError,
};
use crate::llm::EmotionInferer;
use crate::synth::{SynthesisError, Synthesizer, TtsError};

const TEXT_PROMPT: &str = "Text: ";
const EMOTIONS_PROMPT: &str = "Emotions (leave empty for LLM): ";
const LANGUAGE_PROMPT: &str = "Language: ";

// ---------------------------------------------------------------------------
// UserInputError
// ---------------------------------------------------------------------------

/// Operator input that cannot be used.  Always recovered by re-prompting.
#[derive(Debug, Error)]
pub enum UserInputError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("invalid emotions: {0}")]
    Emotions(#[source] ParseError),

    #[error("invalid language: {0}")]
    Language(#[source] ParseError),
}

impl UserInputError {
    /// Guidance printed before the field is asked again.
    pub fn help(&self, vocab: &EmotionVocabulary) -> Option<String> {
        match self {
            UserInputError::EmptyText => None,
            UserInputError::Emotions(_) => Some(emotion_help(vocab)),
            UserInputError::Language(_) => Some(language_help()),
        }
    }
}

/// Trimmed, non-empty text to speak.
pub fn parse_text_input(line: &str) -> Result<String, UserInputError> {
    let text = line.trim();
    if text.is_empty() {
        return Err(UserInputError::EmptyText);
    }
    Ok(text.to_string())
}

/// Operator emotions; `Ok(None)` for an empty line, which asks the LLM.
pub fn parse_emotion_input(
    line: &str,
    vocab: &EmotionVocabulary,
) -> Result<Option<Vec<Emotion>>, UserInputError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    parse_emotions(line, vocab)
        .map(Some)
        .map_err(UserInputError::Emotions)
}

pub fn parse_language_input(line: &str) -> Result<Language, UserInputError> {
    line.parse().map_err(UserInputError::Language)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the annotation corpus for a session.  An empty file is an error.
pub fn load_store(path: &Path) -> Result<AnnotationStore> {
    let store = AnnotationStore::load(path)?;
    if store.is_empty() {
        bail!("no emotion annotations found in {}", path.display());
    }
    log::info!("loaded {} annotation(s) from {}", store.len(), path.display());
    Ok(store)
}

/// `{dir}/{timestamp}_{emotions}.{media_type}` with `:` replaced by `_`.
pub fn output_audio_path(dir: &Path, timestamp: i64, emotions: &[Emotion], media_type: &str) -> PathBuf {
    let label = emotions_to_string(emotions).replace(':', "_");
    dir.join(format!("{timestamp}_{label}.{media_type}"))
}

fn emotion_help(vocab: &EmotionVocabulary) -> String {
    format!(
        "Emotions should be in the format of `type:intensity`.\n\
         Valid types: {}\n\
         Valid intensities: low, moderate, high\n\
         Example: `joy:low,fear:moderate`\n",
        vocab.joined()
    )
}

fn language_help() -> String {
    let codes: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
    format!("Supported languages: {}\n", codes.join(", "))
}

// ---------------------------------------------------------------------------
// InteractiveSession
// ---------------------------------------------------------------------------

pub struct InteractiveSession {
    synth: Synthesizer,
    inferer: EmotionInferer,
    vocab: EmotionVocabulary,
    audios_dir: PathBuf,
}

impl InteractiveSession {
    pub fn new(
        synth: Synthesizer,
        inferer: EmotionInferer,
        vocab: EmotionVocabulary,
        audios_dir: PathBuf,
    ) -> Self {
        Self {
            synth,
            inferer,
            vocab,
            audios_dir,
        }
    }

    /// Run rounds until `input` is exhausted.  Returns the paths written.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<Vec<PathBuf>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut written = Vec::new();

        loop {
            let Some(text) = self.read_text(&mut lines, &mut output).await? else {
                break;
            };
            let Some(emotions) = self.read_emotions(&mut lines, &mut output, &text).await? else {
                break;
            };
            let Some(language) = self.read_language(&mut lines, &mut output).await? else {
                break;
            };

            log::info!("generating audio...");
            let audio = match self.synth.generate(&text, language, &emotions).await {
                Ok(audio) => audio,
                Err(SynthesisError::Tts(TtsError::Timeout)) => {
                    log::error!("timeout occurred, please try again");
                    continue;
                }
                Err(e) => {
                    log::error!("failed to generate audio: {e}");
                    continue;
                }
            };

            let path = output_audio_path(
                &self.audios_dir,
                chrono::Utc::now().timestamp(),
                &emotions,
                &self.synth.config().media_type,
            );
            tokio::fs::create_dir_all(&self.audios_dir)
                .await
                .with_context(|| format!("creating {}", self.audios_dir.display()))?;
            tokio::fs::write(&path, &audio)
                .await
                .with_context(|| format!("writing {}", path.display()))?;

            log::info!("audio saved to {}", path.display());
            output
                .write_all(format!("Audio saved to {}\n", path.display()).as_bytes())
                .await?;
            written.push(path);
        }

        output.flush().await?;
        Ok(written)
    }

    async fn read_text<R, W>(&self, lines: &mut Lines<R>, output: &mut W) -> Result<Option<String>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(line) = ask(lines, output, TEXT_PROMPT).await? else {
                return Ok(None);
            };
            match parse_text_input(&line) {
                Ok(text) => return Ok(Some(text)),
                Err(e) => self.report(output, &e).await?,
            }
        }
    }

    async fn read_emotions<R, W>(
        &self,
        lines: &mut Lines<R>,
        output: &mut W,
        text: &str,
    ) -> Result<Option<Vec<Emotion>>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(line) = ask(lines, output, EMOTIONS_PROMPT).await? else {
                return Ok(None);
            };
            match parse_emotion_input(&line, &self.vocab) {
                Ok(Some(emotions)) => return Ok(Some(emotions)),
                Ok(None) => {
                    log::info!("no emotions specified, using the LLM to infer emotions");
                    let emotions = self.inferer.infer(text).await;
                    log::info!("emotions inferred by LLM: {}", emotions_to_string(&emotions));
                    return Ok(Some(emotions));
                }
                Err(e) => self.report(output, &e).await?,
            }
        }
    }

    async fn read_language<R, W>(&self, lines: &mut Lines<R>, output: &mut W) -> Result<Option<Language>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let Some(line) = ask(lines, output, LANGUAGE_PROMPT).await? else {
                return Ok(None);
            };
            match parse_language_input(&line) {
                Ok(language) => return Ok(Some(language)),
                Err(e) => self.report(output, &e).await?,
            }
        }
    }

    /// Log rejected input and print its help, if any.
    async fn report<W>(&self, output: &mut W, error: &UserInputError) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        log::error!("{error}");
        if let Some(help) = error.help(&self.vocab) {
            output.write_all(help.as_bytes()).await?;
        }
        Ok(())
    }
}

/// Print `prompt` and read one line; `None` at end of input.
async fn ask<R, W>(lines: &mut Lines<R>, output: &mut W, prompt: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(prompt.as_bytes()).await?;
    output.flush().await?;
    Ok(lines.next_line().await?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
