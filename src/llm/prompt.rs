//! Prompt builder for emotion tagging and ad-hoc emotion inference.
//!
//! [`PromptBuilder`] constructs two kinds of prompts:
//! * **Tagging** (`build_tagging`): many transcript lines at once; the model
//!   answers with a JSON object keyed by line identifier.
//! * **Inference** (`build_inference`): a single utterance; the model answers
//!   with a JSON array of emotions.
//!
//! Both embed the allowed emotion types.  [`strip_code_fence`] removes the
//! Markdown fences models like to wrap JSON in.

use crate::emotion::EmotionVocabulary;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

const TAGGING_INSTRUCTION: &str = "\
Your task is to label every transcript line below with emotions, choosing the \
labels that best fit what the line says.

Input format: one line per entry, following the rule
(identifier)speaker: text

Output format:
```json
{
    \"identifier1\": [
        {
            \"type\": \"emotion type, one of: {emotion_types}\",
            \"intensity\": \"emotion intensity, one of: `low`, `moderate`, `high`\"
        }
    ],
    \"identifier2\": [
        {
            \"type\": \"emotion type\",
            \"intensity\": \"emotion intensity\"
        }
    ]
}
```

Notes:
- Each line has at most one identifier. Some lines have no identifier or no \
speaker, only text; those do not need labels and are there to help you judge \
the others.
- Lines may form a conversation. When they do, use the surrounding context to \
label more accurately; otherwise judge each line on its own.
- When a single emotion cannot describe a line, combine several emotion types.
- Make sure every identifier gets labels.

Lines:";

const INFERENCE_INSTRUCTION: &str = "\
Your task is to produce emotion labels for the given text.

An emotion label consists of an emotion type and an intensity.
Emotion types: {emotion_types}
Intensities: low, moderate, high

A text may carry more than one emotion, so produce one or more labels.

Reply with ONLY a JSON array of labels, each with a type and an intensity, \
without explanation.

Example reply:
```json
[
    {\"type\": \"joy\", \"intensity\": \"moderate\"}
]
```

Text:
";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds tagging and inference prompts for a fixed emotion vocabulary.
///
/// # Example
/// ```rust
/// use emotion_tts::emotion::EmotionVocabulary;
/// use emotion_tts::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new(&EmotionVocabulary::default());
/// let prompt = builder.build_inference("What a lovely day!");
/// assert!(prompt.ends_with("What a lovely day!"));
/// ```
pub struct PromptBuilder {
    emotion_types: String,
}

impl PromptBuilder {
    pub fn new(vocab: &EmotionVocabulary) -> Self {
        Self {
            emotion_types: vocab.joined(),
        }
    }

    /// Instructions followed by one formatted entry per line.
    pub fn build_tagging<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut prompt = self.tagging_header();
        for line in lines {
            prompt.push('\n');
            prompt.push_str(line.as_ref());
        }
        prompt
    }

    /// The instruction part of a tagging prompt, without any lines.
    pub fn tagging_header(&self) -> String {
        TAGGING_INSTRUCTION.replace("{emotion_types}", &self.emotion_types)
    }

    pub fn build_inference(&self, text: &str) -> String {
        let mut prompt = INFERENCE_INSTRUCTION.replace("{emotion_types}", &self.emotion_types);
        prompt.push_str(text);
        prompt
    }
}

/// Remove ```` ```json ```` / ```` ``` ```` markers and surrounding whitespace.
pub fn strip_code_fence(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
