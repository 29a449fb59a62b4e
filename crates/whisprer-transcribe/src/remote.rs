use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TranscribeError, Transcriber};

const DEFAULT_ENDPOINT: &str = "https://api.whisprer.app/v1/transcribe";

/// Publishable gateway token for the hosted service. Not a secret; the
/// per-user API key travels in its own header.
const SERVICE_ANON_KEY: &str = "wspr_anon_3f1c9f2e7a6b4d08";

/// Header carrying the user's API key.
const API_KEY_HEADER: &str = "whisprer-api-key";

/// Total per-request deadline, matching the worst observed cold start of
/// the service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Format sent when the audio file has no extension to derive one from.
const FALLBACK_FORMAT: &str = "webm";

/// Configuration for the remote transcription client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_key: String,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Use an endpoint other than the hosted service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeRequest {
    audio_base64: String,
    audio_format: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeResponse {
    transcript: String,
    #[serde(default)]
    remaining_credits: Option<i64>,
}

/// Client for the whisprer transcription service.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(RemoteConfig::new(api_key))
    }
}

#[async_trait]
impl Transcriber for RemoteClient {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        let api_key = self.config.api_key.trim();
        if api_key.is_empty() {
            return Err(TranscribeError::MissingCredential);
        }

        let bytes = tokio::fs::read(audio).await?;
        let format = audio_format(audio);
        debug!(
            endpoint = self.config.endpoint(),
            audio_bytes = bytes.len(),
            format,
            "sending transcription request"
        );

        let request = TranscribeRequest {
            audio_base64: STANDARD.encode(&bytes),
            audio_format: format.to_owned(),
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .header(header::AUTHORIZATION, format!("Bearer {SERVICE_ANON_KEY}"))
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscribeError::Timeout
                } else {
                    TranscribeError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscribeResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TranscribeError::Timeout
            } else {
                TranscribeError::MalformedResponse(e.to_string())
            }
        })?;

        if let Some(credits) = parsed.remaining_credits {
            debug!(remaining_credits = credits, "transcription succeeded");
        }

        Ok(normalize_transcript(&parsed.transcript))
    }

    fn name(&self) -> &str {
        "whisprer"
    }
}

/// Wire format value derived from the file extension.
fn audio_format(path: &Path) -> &str {
    path.extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(FALLBACK_FORMAT)
}

/// Collapse the comma-separated phrase lists the model tends to emit.
///
/// The raw transcript is split on ", ", each piece trimmed, exact
/// duplicates dropped while keeping first-seen order, and the remainder
/// joined with single spaces.
fn normalize_transcript(raw: &str) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    for piece in raw.split(", ") {
        let piece = piece.trim();
        if !pieces.contains(&piece) {
            pieces.push(piece);
        }
    }
    pieces.join(" ")
}
