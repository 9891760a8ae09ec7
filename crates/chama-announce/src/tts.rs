//! Speech emitters: turn announcement text into something a display can play.

use crate::audio::{AudioAsset, AudioStore};
use crate::config::{AnnouncementConfig, RemoteSpeechConfig, SpeechBackend, SystemSpeechConfig};
use crate::error::AnnounceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum text input size for synthesis (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// How the display should realize an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpeechOutcome {
    /// The display speaks the announcement text itself in `lang`.
    Client { lang: String },
    /// The display plays a synthesized clip.
    Audio { asset: AudioAsset },
}

/// Converts text to speech.
///
/// Each call resolves exactly once, either with an outcome or with an
/// error.
#[async_trait]
pub trait SpeechEmitter: Send + Sync {
    async fn emit(&self, text: &str) -> Result<SpeechOutcome, AnnounceError>;

    fn name(&self) -> &'static str;
}

/// Builds the emitter selected by `config.speech`.
///
/// # Errors
///
/// Returns `AnnounceError::Config` when remote speech is selected without
/// an API key.
pub fn build_emitter(
    config: &AnnouncementConfig,
    audio: AudioStore,
) -> Result<Arc<dyn SpeechEmitter>, AnnounceError> {
    match config.speech {
        SpeechBackend::Client => Ok(Arc::new(ClientSpeech::new(config.lang.clone()))),
        SpeechBackend::System => Ok(Arc::new(SystemSpeech::new(
            config.system_speech.clone(),
            audio,
        ))),
        SpeechBackend::Remote => Ok(Arc::new(RemoteSpeech::new(
            &config.remote_speech,
            audio,
        )?)),
    }
}

fn check_input(text: &str) -> Result<(), AnnounceError> {
    if text.trim().is_empty() {
        return Err(AnnounceError::Speech("nothing to speak".to_string()));
    }
    if text.len() > MAX_TTS_INPUT_BYTES {
        return Err(AnnounceError::Speech(format!(
            "text exceeds maximum size: {} bytes (limit: {} bytes)",
            text.len(),
            MAX_TTS_INPUT_BYTES
        )));
    }
    Ok(())
}

/// Delegates speaking to the display's own speech engine.
#[derive(Debug, Clone)]
pub struct ClientSpeech {
    lang: String,
}

impl ClientSpeech {
    pub fn new(lang: impl Into<String>) -> Self {
        Self { lang: lang.into() }
    }
}

#[async_trait]
impl SpeechEmitter for ClientSpeech {
    async fn emit(&self, text: &str) -> Result<SpeechOutcome, AnnounceError> {
        check_input(text)?;
        Ok(SpeechOutcome::Client {
            lang: self.lang.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "client"
    }
}

/// Synthesizes speech with the local `espeak-ng`.
#[derive(Debug, Clone)]
pub struct SystemSpeech {
    config: SystemSpeechConfig,
    audio: AudioStore,
}

impl SystemSpeech {
    pub fn new(config: SystemSpeechConfig, audio: AudioStore) -> Self {
        Self { config, audio }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AnnounceError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        // Text goes through stdin so a name starting with '-' is never an option.
        let mut command = Command::new(&self.config.binary);
        command
            .arg("-v")
            .arg(&self.config.voice)
            .arg("--stdout")
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            AnnounceError::Speech(format!("Failed to spawn {}: {}", self.config.binary, e))
        })?;
        let mut stdin = child.stdin.take().ok_or_else(|| {
            AnnounceError::Speech(format!("{} has no stdin", self.config.binary))
        })?;

        let run = async move {
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                tracing::debug!(error = %e, "system TTS closed its input early");
            }
            drop(stdin);
            child.wait_with_output().await
        };

        let output = tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| {
                AnnounceError::Speech(format!(
                    "System TTS process timed out after {} seconds",
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AnnounceError::Speech(format!("Failed to wait for {}: {}", self.config.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnnounceError::Speech(format!(
                "{} failed: {}",
                self.config.binary, stderr
            )));
        }

        if output.stdout.is_empty() {
            return Err(AnnounceError::Speech(format!(
                "{} produced no audio",
                self.config.binary
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SpeechEmitter for SystemSpeech {
    async fn emit(&self, text: &str) -> Result<SpeechOutcome, AnnounceError> {
        check_input(text)?;
        let wav = self.synthesize(text).await?;
        let asset = self.audio.put("audio/wav", wav).await;
        Ok(SpeechOutcome::Audio { asset })
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

/// Synthesizes speech over an OpenAI-compatible `/audio/speech` API.
pub struct RemoteSpeech {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
    audio: AudioStore,
}

impl RemoteSpeech {
    /// # Errors
    ///
    /// Returns `AnnounceError::Config` if no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &RemoteSpeechConfig, audio: AudioStore) -> Result<Self, AnnounceError> {
        if config.api_key.trim().is_empty() {
            return Err(AnnounceError::Config(
                "remote speech requires an API key".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnnounceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/audio/speech", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            voice: config.voice.clone(),
            audio,
        })
    }
}

#[async_trait]
impl SpeechEmitter for RemoteSpeech {
    async fn emit(&self, text: &str) -> Result<SpeechOutcome, AnnounceError> {
        check_input(text)?;

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnnounceError::Speech(format!("TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnnounceError::Speech(format!("TTS API error {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnnounceError::Speech(format!("failed to read TTS audio: {e}")))?;
        if bytes.is_empty() {
            return Err(AnnounceError::Speech("TTS API returned no audio".to_string()));
        }

        let asset = self.audio.put("audio/mpeg", bytes.to_vec()).await;
        Ok(SpeechOutcome::Audio { asset })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
