//! Validation of a batch-tagging reply.
//!
//! The reply must be a JSON object mapping line identifiers to arrays of
//! `{type, intensity}` objects.  Every labelled line in the required part of
//! the window must be present and valid, or the whole reply is rejected.
//! Overlap-tail entries are optional: valid ones are kept, anything else about
//! them is ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::batch::BatchWindow;
use super::list_file::ListFileAnnotation;
use crate::emotion::{Emotion, EmotionAnnotation, EmotionVocabulary, Intensity};
use crate::llm::strip_code_fence;

/// Reasons a batch reply is rejected.  All of them trigger a retry.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply is not a JSON object keyed by identifier")]
    NotAnObject,

    #[error("reply has no labels for {0:?}")]
    MissingIdentifier(String),

    #[error("labels for {identifier:?} are not a list of {{type, intensity}}: {source}")]
    MalformedLabels {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid emotion type {kind:?} for {identifier:?}")]
    InvalidType { identifier: String, kind: String },

    #[error("invalid emotion intensity {intensity:?} for {identifier:?}")]
    InvalidIntensity { identifier: String, intensity: String },
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(rename = "type")]
    kind: String,
    intensity: String,
}

/// Validate `reply` against `window` and build the annotations it yields.
///
/// Output order follows the window's line order.
pub fn parse_reply(
    reply: &str,
    window: &BatchWindow<'_>,
    vocab: &EmotionVocabulary,
) -> Result<Vec<EmotionAnnotation>, ValidationError> {
    let value: Value = serde_json::from_str(&strip_code_fence(reply))?;
    let Value::Object(labels) = value else {
        return Err(ValidationError::NotAnObject);
    };

    let duplicates = window.duplicate_identifiers();
    if !duplicates.is_empty() {
        log::warn!(
            "batch at line {} has lines sharing identifiers {duplicates:?}; they receive the same labels",
            window.start
        );
    }

    let mut annotations = Vec::with_capacity(window.lines.len());

    for line in window.required_lines() {
        let Some(identifier) = line.identifier() else {
            continue;
        };
        let raw = labels
            .get(&identifier)
            .ok_or_else(|| ValidationError::MissingIdentifier(identifier.clone()))?;
        annotations.push(annotate(line, &identifier, raw, vocab)?);
    }

    for line in window.overlap_lines() {
        if let Some(annotation) = optional_annotation(line, &labels, vocab) {
            annotations.push(annotation);
        }
    }

    Ok(annotations)
}

fn optional_annotation(
    line: &ListFileAnnotation,
    labels: &Map<String, Value>,
    vocab: &EmotionVocabulary,
) -> Option<EmotionAnnotation> {
    let identifier = line.identifier()?;
    let raw = labels.get(&identifier)?;
    match annotate(line, &identifier, raw, vocab) {
        Ok(annotation) => Some(annotation),
        Err(e) => {
            log::debug!("ignoring overlap label: {e}");
            None
        }
    }
}

fn annotate(
    line: &ListFileAnnotation,
    identifier: &str,
    raw: &Value,
    vocab: &EmotionVocabulary,
) -> Result<EmotionAnnotation, ValidationError> {
    let labels = Vec::<RawLabel>::deserialize(raw).map_err(|source| {
        ValidationError::MalformedLabels {
            identifier: identifier.to_string(),
            source,
        }
    })?;

    let emotions = labels
        .into_iter()
        .map(|label| {
            if !vocab.contains(&label.kind) {
                return Err(ValidationError::InvalidType {
                    identifier: identifier.to_string(),
                    kind: label.kind,
                });
            }
            let intensity = label.intensity.parse::<Intensity>().map_err(|_| {
                ValidationError::InvalidIntensity {
                    identifier: identifier.to_string(),
                    intensity: label.intensity.clone(),
                }
            })?;
            Ok(Emotion::new(label.kind, intensity))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EmotionAnnotation {
        // Paths are only absent on context lines, which have no identifier.
        file: line.path.clone().unwrap_or_default(),
        text: line.text.clone(),
        language: line.language,
        emotions,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Language;
    use crate::tagger::batch::windows;

    fn line(path: Option<&str>, text: &str) -> ListFileAnnotation {
        ListFileAnnotation {
            path: path.map(Into::into),
            speaker: Some("Texas".into()),
            language: Language::Ja,
            text: text.into(),
        }
    }

    fn input() -> Vec<ListFileAnnotation> {
        vec![
            line(Some("v/tx_01.wav"), "一"),
            line(None, "narration"),
            line(Some("v/tx_02.wav"), "二"),
            line(Some("v/tx_03.wav"), "三"),
        ]
    }

    fn vocab() -> EmotionVocabulary {
        EmotionVocabulary::default()
    }

    #[test]
    fn valid_reply_yields_required_lines_in_order() {
        let lines = input();
        let window = windows(&lines, 3, 1)[0];
        let reply = r#"```json
        {
            "tx_02": [{"type": "sadness", "intensity": "high"}],
            "tx_01": [{"type": "joy", "intensity": "low"}, {"type": "surprise", "intensity": "moderate"}]
        }
        ```"#;

        let annotations = parse_reply(reply, &window, &vocab()).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].file, std::path::PathBuf::from("v/tx_01.wav"));
        assert_eq!(annotations[0].emotions.len(), 2);
        assert_eq!(annotations[0].language, Language::Ja);
        assert_eq!(annotations[1].text, "二");
        assert_eq!(
            annotations[1].emotions,
            vec![Emotion::new("sadness", Intensity::High)]
        );
    }

    #[test]
    fn overlap_labels_are_kept_when_valid() {
        let lines = input();
        let window = windows(&lines, 3, 1)[0];
        let reply = r#"{
            "tx_01": [{"type": "joy", "intensity": "low"}],
            "tx_02": [{"type": "joy", "intensity": "low"}],
            "tx_03": [{"type": "anger", "intensity": "high"}]
        }"#;
        let annotations = parse_reply(reply, &window, &vocab()).unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[2].file, std::path::PathBuf::from("v/tx_03.wav"));
    }

    #[test]
    fn invalid_overlap_labels_are_ignored() {
        let lines = input();
        let window = windows(&lines, 3, 1)[0];
        let reply = r#"{
            "tx_01": [{"type": "joy", "intensity": "low"}],
            "tx_02": [{"type": "joy", "intensity": "low"}],
            "tx_03": [{"type": "rage", "intensity": "high"}]
        }"#;
        let annotations = parse_reply(reply, &window, &vocab()).unwrap();
        assert_eq!(annotations.len(), 2);
    }

    #[test]
    fn missing_required_identifier_rejects_reply() {
        let lines = input();
        let window = windows(&lines, 3, 1)[0];
        let reply = r#"{"tx_01": [{"type": "joy", "intensity": "low"}]}"#;
        let err = parse_reply(reply, &window, &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingIdentifier(id) if id == "tx_02"));
    }

    #[test]
    fn invalid_type_or_intensity_rejects_reply() {
        let lines = input();
        let window = windows(&lines, 1, 0)[0];

        let err = parse_reply(
            r#"{"tx_01": [{"type": "rage", "intensity": "low"}]}"#,
            &window,
            &vocab(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { .. }));

        let err = parse_reply(
            r#"{"tx_01": [{"type": "joy", "intensity": "extreme"}]}"#,
            &window,
            &vocab(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIntensity { .. }));
    }

    #[test]
    fn malformed_replies_are_rejected() {
        let lines = input();
        let window = windows(&lines, 1, 0)[0];

        assert!(matches!(
            parse_reply("Sure! Here are the labels:", &window, &vocab()),
            Err(ValidationError::Json(_))
        ));
        assert!(matches!(
            parse_reply("[]", &window, &vocab()),
            Err(ValidationError::NotAnObject)
        ));
        assert!(matches!(
            parse_reply(r#"{"tx_01": "joy"}"#, &window, &vocab()),
            Err(ValidationError::MalformedLabels { .. })
        ));
    }

    #[test]
    fn context_only_window_accepts_empty_object() {
        let lines = vec![line(None, "narration")];
        let window = windows(&lines, 200, 20)[0];
        assert!(parse_reply("{}", &window, &vocab()).unwrap().is_empty());
    }
}
