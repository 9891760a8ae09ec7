use crate::audio::AudioStore;
use crate::config::AnnouncementConfig;
use crate::error::AnnounceError;
use crate::renderer::{build_renderer, TextRenderer};
use crate::tts::{build_emitter, SpeechEmitter, SpeechOutcome};
use chama_types::CallRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A rendered and realized announcement, ready for the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub call_id: String,
    pub text: String,
    pub speech: SpeechOutcome,
}

/// Text renderer followed by speech emitter.
#[derive(Clone)]
pub struct Announcer {
    renderer: Arc<dyn TextRenderer>,
    speech: Arc<dyn SpeechEmitter>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("renderer", &self.renderer.name())
            .field("speech", &self.speech.name())
            .finish()
    }
}

impl Announcer {
    pub fn new(renderer: Arc<dyn TextRenderer>, speech: Arc<dyn SpeechEmitter>) -> Self {
        Self { renderer, speech }
    }

    /// Builds the renderer and emitter selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AnnounceError::Config` if a remote backend is selected
    /// without credentials.
    pub fn from_config(config: &AnnouncementConfig, audio: AudioStore) -> Result<Self, AnnounceError> {
        let renderer = build_renderer(config)?;
        let speech = build_emitter(config, audio)?;
        tracing::info!(
            renderer = renderer.name(),
            speech = speech.name(),
            "announcer configured"
        );
        Ok(Self::new(renderer, speech))
    }

    /// Renders and speaks one call. Resolves exactly once: the announcement
    /// or the first error encountered. Speech is not attempted when
    /// rendering fails.
    pub async fn announce(&self, call: &CallRecord) -> Result<Announcement, AnnounceError> {
        let text = self.renderer.render(call).await?;
        let speech = self.speech.emit(&text).await?;
        tracing::info!(
            call_id = %call.id,
            renderer = self.renderer.name(),
            speech = self.speech.name(),
            "call announced"
        );
        Ok(Announcement {
            call_id: call.id.clone(),
            text,
            speech,
        })
    }
}
