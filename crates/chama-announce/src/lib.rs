//! Spoken announcements for the Chama calling board.
//!
//! A display session feeds every current call through a [`DedupGate`] so
//! each call ID is announced at most once in a row. Admitted calls go to the
//! [`Announcer`], which renders the text (fixed template or remote
//! generation) and hands it to a [`SpeechEmitter`]. Speech is either left
//! to the display's own speech engine or synthesized on the server and
//! cached in an [`AudioStore`] for the display to fetch.

pub mod announcer;
pub mod audio;
pub mod config;
pub mod error;
pub mod gate;
pub mod renderer;
pub mod tts;

pub use announcer::{Announcement, Announcer};
pub use audio::{AudioAsset, AudioStore, StoredAudio, DEFAULT_AUDIO_CAPACITY};
pub use config::{
    AnnouncementConfig, AnnouncementSource, GenerationConfig, RemoteSpeechConfig, SpeechBackend,
    SystemSpeechConfig,
};
pub use error::AnnounceError;
pub use gate::{DedupGate, GateState};
pub use renderer::{
    announcement_prompt, build_renderer, title_case, RemoteRenderer, TemplateRenderer,
    TextRenderer,
};
pub use tts::{build_emitter, ClientSpeech, RemoteSpeech, SpeechEmitter, SpeechOutcome, SystemSpeech};
