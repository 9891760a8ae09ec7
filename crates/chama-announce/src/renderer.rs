//! Announcement text rendering.
//!
//! Two renderers share the [`TextRenderer`] seam: a deterministic Portuguese
//! template and a remote OpenAI-compatible chat completion with a fixed
//! clinic prompt.

use crate::config::{AnnouncementConfig, AnnouncementSource, GenerationConfig};
use crate::error::AnnounceError;
use async_trait::async_trait;
use chama_types::CallRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Turns a call record into the sentence to be spoken.
#[async_trait]
pub trait TextRenderer: Send + Sync {
    async fn render(&self, call: &CallRecord) -> Result<String, AnnounceError>;

    fn name(&self) -> &'static str;
}

/// Builds the renderer selected by `config.source`.
///
/// # Errors
///
/// Returns `AnnounceError::Config` when remote generation is selected
/// without an API key.
pub fn build_renderer(config: &AnnouncementConfig) -> Result<Arc<dyn TextRenderer>, AnnounceError> {
    match config.source {
        AnnouncementSource::Template => Ok(Arc::new(TemplateRenderer::new(
            config.include_professional,
        ))),
        AnnouncementSource::RemoteGenerated => {
            Ok(Arc::new(RemoteRenderer::new(&config.generation)?))
        }
    }
}

/// Capitalizes the first letter of every word and lowercases the rest.
///
/// `"joão  SILVA"` becomes `"João Silva"`. Runs of whitespace collapse to a
/// single space.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Fixed template: `Olá, {Name}, [atendimento com {professional}, ]dirija-se à sala {room}.`
#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer {
    include_professional: bool,
}

impl TemplateRenderer {
    pub fn new(include_professional: bool) -> Self {
        Self {
            include_professional,
        }
    }

    pub fn render_text(&self, call: &CallRecord) -> String {
        let name = title_case(&call.patient_name);
        match call.professional_name.as_deref() {
            Some(professional) if self.include_professional => format!(
                "Olá, {name}, atendimento com {professional}, dirija-se à sala {}.",
                call.room_number
            ),
            _ => format!("Olá, {name}, dirija-se à sala {}.", call.room_number),
        }
    }
}

#[async_trait]
impl TextRenderer for TemplateRenderer {
    async fn render(&self, call: &CallRecord) -> Result<String, AnnounceError> {
        Ok(self.render_text(call))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

const ANNOUNCEMENT_PROMPT: &str = "Você é um assistente educado e profissional para anúncios de pacientes em uma Unidade Básica de Saúde (UBS).
Sua tarefa é criar um texto de anúncio claro e cortês em português (pt-BR) para chamar um paciente para uma sala específica.
O anúncio deve ser conciso e fácil de entender.

Use as seguintes informações:
Nome do paciente: {patient_name}
Número da sala: {room_number}

Exemplo de anúncio:
Olá, {nome do paciente}, por favor, dirija-se à sala {número da sala}. Obrigada.

Por favor, gere o anúncio usando o nome e o número da sala fornecidos, seguindo o tom profissional e educado da UBS.
Responda apenas com o texto do anúncio.";

/// Fills the clinic prompt with the patient name and room.
pub fn announcement_prompt(patient_name: &str, room_number: &str) -> String {
    ANNOUNCEMENT_PROMPT
        .replace("{patient_name}", patient_name)
        .replace("{room_number}", room_number)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Remote text generation over an OpenAI-compatible chat completion API.
pub struct RemoteRenderer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl RemoteRenderer {
    /// # Errors
    ///
    /// Returns `AnnounceError::Config` if no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self, AnnounceError> {
        if config.api_key.trim().is_empty() {
            return Err(AnnounceError::Config(
                "remote announcement generation requires an API key".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnnounceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextRenderer for RemoteRenderer {
    async fn render(&self, call: &CallRecord) -> Result<String, AnnounceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: announcement_prompt(&call.patient_name, &call.room_number),
            }],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnnounceError::GenerationFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnnounceError::GenerationFailed(format!(
                "API error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AnnounceError::GenerationFailed(format!("failed to parse response: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnnounceError::EmptyGeneration);
        }

        tracing::debug!(call_id = %call.id, model = %self.model, "announcement text generated");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "remote-generated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, room: &str, professional: Option<&str>) -> CallRecord {
        CallRecord {
            id: "a".to_string(),
            patient_name: name.to_string(),
            room_number: room.to_string(),
            professional_name: professional.map(str::to_string),
            seq: 1,
            created_at: "2024-05-01 09:00:00".to_string(),
        }
    }

    #[test]
    fn title_case_handles_accents_and_spacing() {
        assert_eq!(title_case("joão silva"), "João Silva");
        assert_eq!(title_case("  MARIA   aparecida  "), "Maria Aparecida");
        assert_eq!(title_case("élio"), "Élio");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn template_without_professional() {
        let text = TemplateRenderer::new(true).render_text(&call("joão silva", "5", None));
        assert_eq!(text, "Olá, João Silva, dirija-se à sala 5.");
    }

    #[test]
    fn template_with_professional() {
        let text = TemplateRenderer::new(true).render_text(&call(
            "ana",
            "2 Consultório",
            Some("Doutora Bruna"),
        ));
        assert_eq!(
            text,
            "Olá, Ana, atendimento com Doutora Bruna, dirija-se à sala 2 Consultório."
        );
    }

    #[test]
    fn template_can_omit_professional() {
        let text = TemplateRenderer::new(false).render_text(&call(
            "ana",
            "2",
            Some("Doutora Bruna"),
        ));
        assert_eq!(text, "Olá, Ana, dirija-se à sala 2.");
    }

    #[test]
    fn prompt_contains_inputs() {
        let prompt = announcement_prompt("joão silva", "5");
        assert!(prompt.contains("Nome do paciente: joão silva"));
        assert!(prompt.contains("Número da sala: 5"));
    }

    #[test]
    fn remote_requires_api_key() {
        let err = RemoteRenderer::new(&GenerationConfig::default())
            .err()
            .expect("missing key should fail");
        assert!(matches!(err, AnnounceError::Config(_)));
    }

    #[test]
    fn build_renderer_follows_source() {
        let renderer = build_renderer(&AnnouncementConfig::default()).unwrap();
        assert_eq!(renderer.name(), "template");

        let mut config = AnnouncementConfig::default();
        config.source = AnnouncementSource::RemoteGenerated;
        config.generation.api_key = "key".to_string();
        assert_eq!(build_renderer(&config).unwrap().name(), "remote-generated");
    }
}
