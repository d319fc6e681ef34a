//! `TtsClient` trait and the GPT-SoVITS HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::request::SynthesisRequest;
use crate::config::InferenceConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TtsError {
    /// The backend rejected the request (HTTP 400); carries its message.
    #[error("synthesis backend rejected the request: {0}")]
    Backend(String),

    /// No response within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// Any other non-success status.
    #[error("synthesis API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or transport failure.
    #[error("synthesis request failed: {0}")]
    Request(String),

    #[error("invalid synthesis client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TtsClient trait
// ---------------------------------------------------------------------------

/// Async speech synthesis backend.  Returns the raw encoded audio.
#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError>;
}

// ---------------------------------------------------------------------------
// ApiTtsClient
// ---------------------------------------------------------------------------

/// POSTs JSON to `{base_url}/tts`.
pub struct ApiTtsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiTtsClient {
    pub fn from_config(config: &InferenceConfig) -> Result<Self, TtsError> {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TtsError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/tts", self.base_url)
    }
}

#[async_trait]
impl TtsClient for ApiTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        log::debug!(
            "POST {} ref={} aux={}",
            self.endpoint(),
            request.ref_audio_path.display(),
            request.aux_ref_audio_paths.len()
        );

        let response = self.client.post(self.endpoint()).json(request).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Backend(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
