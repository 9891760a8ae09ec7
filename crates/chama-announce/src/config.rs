use serde::{Deserialize, Serialize};
use std::fmt;

/// Where announcement text comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnouncementSource {
    /// Fixed Portuguese template, no network.
    #[default]
    Template,
    /// Remote text generation with a fixed prompt.
    RemoteGenerated,
}

/// How announcement text becomes sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechBackend {
    /// The display browser speaks the text with its own voice.
    #[default]
    Client,
    /// Local `espeak-ng`, served to the display as a WAV asset.
    System,
    /// Remote text-to-audio API, served to the display as an MP3 asset.
    Remote,
}

fn default_lang() -> String {
    "pt-BR".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_speech_voice() -> String {
    "nova".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_espeak_binary() -> String {
    "espeak-ng".to_string()
}

fn default_espeak_voice() -> String {
    "pt-br".to_string()
}

/// Announcement settings for every display served by this process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementConfig {
    #[serde(default)]
    pub source: AnnouncementSource,
    /// Mention the professional in template text when the call has one.
    #[serde(default = "default_true")]
    pub include_professional: bool,
    #[serde(default)]
    pub speech: SpeechBackend,
    /// BCP 47 language tag passed to client-side speech.
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub remote_speech: RemoteSpeechConfig,
    #[serde(default)]
    pub system_speech: SystemSpeechConfig,
}

fn default_true() -> bool {
    true
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            source: AnnouncementSource::default(),
            include_professional: true,
            speech: SpeechBackend::default(),
            lang: default_lang(),
            generation: GenerationConfig::default(),
            remote_speech: RemoteSpeechConfig::default(),
            system_speech: SystemSpeechConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint used for remote text.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_generation_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI-compatible text-to-audio endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteSpeechConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    #[serde(default = "default_speech_voice")]
    pub voice: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteSpeechConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_speech_model(),
            voice: default_speech_voice(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for RemoteSpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSpeechConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Local `espeak-ng` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSpeechConfig {
    #[serde(default = "default_espeak_binary")]
    pub binary: String,
    #[serde(default = "default_espeak_voice")]
    pub voice: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SystemSpeechConfig {
    fn default() -> Self {
        Self {
            binary: default_espeak_binary(),
            voice: default_espeak_voice(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
