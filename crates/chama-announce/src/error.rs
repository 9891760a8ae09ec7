use thiserror::Error;

/// Announcement failures. The display treats every variant the same way:
/// the call stays marked as announced and a notice is shown.
#[derive(Error, Debug)]
pub enum AnnounceError {
    /// The remote text generation call failed (transport, HTTP status, or
    /// unparseable response).
    #[error("announcement generation failed: {0}")]
    GenerationFailed(String),

    /// The remote text generation call succeeded but produced no text.
    #[error("announcement generation produced empty text")]
    EmptyGeneration,

    #[error("speech error: {0}")]
    Speech(String),

    #[error("invalid announcement configuration: {0}")]
    Config(String),
}

impl AnnounceError {
    /// Short Portuguese notice for the display.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::GenerationFailed(_) | Self::EmptyGeneration => {
                "Não foi possível gerar o texto do anúncio."
            }
            Self::Speech(_) => "Não foi possível reproduzir o anúncio.",
            Self::Config(_) => "Anúncio por voz indisponível.",
        }
    }
}
