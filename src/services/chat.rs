//! Chat assistant service implementation
//!
//! Conversations are kept per user behind [`ConversationStore`]. Replies come
//! from an OpenAI-compatible chat-completion endpoint when one is configured,
//! otherwise from a keyword table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::redis::RedisService;
use crate::config::settings::ChatConfig;
use crate::models::chat::{
    ChatMessage, ChatReply, ChatRole, CompletionMessage, CompletionRequest, CompletionResponse, FaqCategory,
    FaqEntry, MAX_CHAT_MESSAGE_LENGTH,
};
use crate::utils::errors::{ChatError, ChatResult, Result, VincuHubError};

pub const WELCOME_MESSAGE: &str = "¡Hola! 👋 Soy VincuHub Assistant, tu asistente virtual. Estoy aquí para ayudarte \
con todo lo relacionado a eventos y horas de vinculación en CEUTEC. ¿En qué puedo ayudarte hoy?";

pub const APOLOGY_MESSAGE: &str = "Lo siento, hubo un error al procesar tu mensaje. Por favor, intenta de nuevo.";

const SYSTEM_PROMPT: &str = "Eres VincuHub Assistant, un asistente virtual amigable y profesional de la plataforma \
VincuHub de CEUTEC (Centro Universitario Tecnológico).
Tu función es ayudar a estudiantes, coordinadores y administradores con la plataforma de gestión de eventos y horas \
de vinculación.

INFORMACIÓN CLAVE:
- CEUTEC es una institución educativa con campus en San Pedro Sula, Tegucigalpa y La Ceiba
- La plataforma permite gestionar eventos, actividades y ferias universitarias
- Los estudiantes deben completar 60 horas de vinculación
- Los estudiantes pueden inscribirse en eventos y ver su historial
- Los coordinadores pueden crear y gestionar eventos
- Los administradores tienen control total del sistema

RESPONDE DE MANERA:
- Clara y concisa
- Profesional pero amigable
- En español
- Con pasos numerados cuando sea apropiado
- Sugiriendo secciones específicas de la plataforma cuando sea relevante

Si no sabes algo, admítelo y sugiere contactar al soporte técnico o coordinador.";

pub const FAQS: [FaqEntry; 5] = [
    FaqEntry { pregunta: "¿Cómo me inscribo en un evento?", categoria: FaqCategory::Eventos },
    FaqEntry { pregunta: "¿Cómo funcionan las horas de vinculación?", categoria: FaqCategory::Vinculacion },
    FaqEntry { pregunta: "¿Dónde veo mis eventos inscritos?", categoria: FaqCategory::Eventos },
    FaqEntry { pregunta: "¿Cómo cancelo una inscripción?", categoria: FaqCategory::Eventos },
    FaqEntry { pregunta: "¿Quién puede crear eventos?", categoria: FaqCategory::General },
];

/// Keyword groups and their canned answers, checked in order
const KEYWORD_REPLIES: &[(&[&str], &str)] = &[
    (
        &["cancel"],
        "Para cancelar una inscripción:\n1. Ve a tu dashboard\n2. Busca el evento en \"Próximos eventos\"\n\
         3. Presiona \"Cancelar inscripción\"\nSolo puedes cancelar mientras no se haya registrado tu asistencia.",
    ),
    (
        &["inscrib", "inscripci", "registr"],
        "Para inscribirte en un evento:\n1. Ingresa a tu dashboard de estudiante\n\
         2. Revisa la lista de eventos disponibles\n3. Presiona \"📝 Inscribirse\" en el evento que te interese\n\
         Si el evento muestra \"🚫 Cupo Lleno\" ya no hay espacios disponibles.",
    ),
    (
        &["hora", "vinculaci"],
        "Debes completar 60 horas de vinculación. Las horas se acreditan cuando el coordinador registra tu \
         asistencia al evento. Puedes ver tu progreso en las estadísticas de tu dashboard.",
    ),
    (
        &["crear", "crea "],
        "Los coordinadores y administradores pueden crear eventos desde su dashboard. Los estudiantes solo \
         pueden inscribirse en los eventos publicados.",
    ),
    (
        &["certificado", "constancia"],
        "Cuando un evento finaliza y tu asistencia está registrada, puedes descargar tu certificado de \
         participación en PDF desde la sección de eventos completados.",
    ),
    (
        &["foro", "mensaje"],
        "Cada evento tiene un foro donde puedes conversar con otros participantes y con el coordinador. \
         Abre el evento y selecciona \"Foro\" para participar.",
    ),
    (
        &["hola", "buenas", "saludos"],
        "¡Hola! ¿En qué puedo ayudarte? Puedo orientarte sobre inscripciones, horas de vinculación, \
         certificados y foros.",
    ),
];

const DEFAULT_REPLY: &str = "No estoy seguro de cómo ayudarte con eso. Puedes preguntarme sobre inscripciones, \
horas de vinculación, certificados o foros. Si necesitas más ayuda, contacta a tu coordinador o al soporte técnico.";

/// Answer from the keyword table, falling back to a default reply
pub fn keyword_reply(mensaje: &str) -> &'static str {
    let lowered = mensaje.to_lowercase();
    KEYWORD_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

/// Per-user conversation persistence
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, uid: Uuid) -> Result<Option<Vec<ChatMessage>>>;

    async fn save(&self, uid: Uuid, messages: &[ChatMessage]) -> Result<()>;

    async fn clear(&self, uid: Uuid) -> Result<()>;
}

/// Conversations stored as JSON under `chat:<uid>` with the Redis TTL
#[derive(Clone, Debug)]
pub struct RedisConversationStore {
    redis: RedisService,
}

impl RedisConversationStore {
    pub fn new(redis: RedisService) -> Self {
        Self { redis }
    }

    fn key(uid: Uuid) -> String {
        format!("chat:{}", uid)
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn load(&self, uid: Uuid) -> Result<Option<Vec<ChatMessage>>> {
        self.redis.get(&Self::key(uid)).await
    }

    async fn save(&self, uid: Uuid, messages: &[ChatMessage]) -> Result<()> {
        self.redis.set(&Self::key(uid), &messages, None).await
    }

    async fn clear(&self, uid: Uuid) -> Result<()> {
        self.redis.delete(&Self::key(uid)).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn load(&self, uid: Uuid) -> Result<Option<Vec<ChatMessage>>> {
        Ok(self.conversations.read().await.get(&uid).cloned())
    }

    async fn save(&self, uid: Uuid, messages: &[ChatMessage]) -> Result<()> {
        self.conversations.write().await.insert(uid, messages.to_vec());
        Ok(())
    }

    async fn clear(&self, uid: Uuid) -> Result<()> {
        self.conversations.write().await.remove(&uid);
        Ok(())
    }
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    client: Client,
    config: ChatConfig,
    completion_enabled: bool,
}

impl ChatService {
    pub fn new(store: Arc<dyn ConversationStore>, config: ChatConfig, completion_enabled: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("VincuHub/1.0")
            .build()?;

        let completion_enabled = completion_enabled && config.api_key.as_deref().is_some_and(|k| !k.is_empty());

        Ok(Self {
            store,
            client,
            config,
            completion_enabled,
        })
    }

    pub fn is_completion_enabled(&self) -> bool {
        self.completion_enabled
    }

    pub fn faqs(&self) -> &'static [FaqEntry] {
        &FAQS
    }

    fn welcome() -> Vec<ChatMessage> {
        vec![ChatMessage::assistant(WELCOME_MESSAGE)]
    }

    /// Stored conversation, or a fresh one holding the welcome message
    pub async fn history(&self, uid: Uuid) -> Result<Vec<ChatMessage>> {
        Ok(self.store.load(uid).await?.unwrap_or_else(Self::welcome))
    }

    pub async fn send_message(&self, uid: Uuid, contenido: &str) -> Result<ChatReply> {
        let contenido = contenido.trim();
        if contenido.is_empty() {
            return Err(VincuHubError::invalid("El mensaje no puede estar vacío"));
        }
        if contenido.chars().count() > MAX_CHAT_MESSAGE_LENGTH {
            return Err(VincuHubError::invalid(format!(
                "El mensaje no puede exceder {} caracteres",
                MAX_CHAT_MESSAGE_LENGTH
            )));
        }

        let mut historial = self.history(uid).await?;
        let reply_text = if self.completion_enabled {
            match self.request_completion(&historial, contenido).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(uid = %uid, error = %e, "Chat completion failed, replying with apology");
                    APOLOGY_MESSAGE.to_string()
                }
            }
        } else {
            keyword_reply(contenido).to_string()
        };

        historial.push(ChatMessage::user(contenido));
        let respuesta = ChatMessage::assistant(reply_text);
        historial.push(respuesta.clone());

        let overflow = historial.len().saturating_sub(self.config.stored_messages);
        if overflow > 0 {
            historial.drain(..overflow);
        }

        self.store.save(uid, &historial).await?;
        debug!(uid = %uid, messages = historial.len(), "Conversation saved");

        Ok(ChatReply { respuesta, historial })
    }

    /// Reset the conversation to the welcome message
    pub async fn clear(&self, uid: Uuid) -> Result<Vec<ChatMessage>> {
        self.store.clear(uid).await?;
        info!(uid = %uid, "Conversation cleared");
        Ok(Self::welcome())
    }

    fn build_request(&self, historial: &[ChatMessage], contenido: &str) -> CompletionRequest {
        let start = historial.len().saturating_sub(self.config.history_limit);

        let mut messages = Vec::with_capacity(historial.len() - start + 2);
        messages.push(CompletionMessage::new("system", SYSTEM_PROMPT));
        messages.extend(
            historial[start..]
                .iter()
                .map(|m| CompletionMessage::new(m.role.api_name(), m.content.clone())),
        );
        messages.push(CompletionMessage::new(ChatRole::User.api_name(), contenido));

        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn request_completion(&self, historial: &[ChatMessage], contenido: &str) -> ChatResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or(ChatError::NotConfigured)?;
        let request = self.build_request(historial, contenido);

        debug!(model = %request.model, messages = request.messages.len(), "Requesting chat completion");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChatError::InvalidResponse("no choices returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;

    fn service() -> ChatService {
        let store = Arc::new(MemoryConversationStore::new());
        ChatService::new(store, Settings::default().chat, false).unwrap()
    }

    #[test]
    fn test_keyword_table() {
        assert!(keyword_reply("¿Cómo me INSCRIBO?").contains("Inscribirse"));
        assert!(keyword_reply("cuantas horas necesito").contains("60 horas"));
        assert!(keyword_reply("quiero cancelar mi inscripción").starts_with("Para cancelar"));
        assert_eq!(keyword_reply("xyz"), DEFAULT_REPLY);
    }

    #[test]
    fn test_completion_disabled_without_key() {
        let mut config = Settings::default().chat;
        config.api_key = Some(String::new());
        let chat = ChatService::new(Arc::new(MemoryConversationStore::new()), config, true).unwrap();
        assert!(!chat.is_completion_enabled());
    }

    #[test]
    fn test_request_keeps_last_messages_only() {
        let chat = service();
        let historial: Vec<ChatMessage> = (0..15).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        let request = chat.build_request(&historial, "nuevo");

        // system + 10 history + new message
        assert_eq!(request.messages.len(), 12);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "m5");
        assert_eq!(request.messages[11].content, "nuevo");
        assert_eq!(request.max_tokens, 500);
    }

    #[tokio::test]
    async fn test_send_and_clear() {
        let chat = service();
        let uid = Uuid::new_v4();

        assert_eq!(chat.history(uid).await.unwrap()[0].content, WELCOME_MESSAGE);

        let reply = chat.send_message(uid, "hola").await.unwrap();
        assert_eq!(reply.historial.len(), 3);
        assert_eq!(reply.respuesta.role, ChatRole::Assistant);

        let cleared = chat.clear(uid).await.unwrap();
        assert_eq!(cleared.len(), 1);
        assert_eq!(chat.history(uid).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        assert!(service().send_message(Uuid::new_v4(), "   ").await.is_err());
    }

    #[tokio::test]
    async fn test_overlong_message_rejected_before_storing() {
        let chat = service();
        let uid = Uuid::new_v4();

        let result = chat.send_message(uid, &"ñ".repeat(MAX_CHAT_MESSAGE_LENGTH + 1)).await;
        assert!(matches!(result, Err(VincuHubError::InvalidInput(_))));
        assert_eq!(chat.history(uid).await.unwrap().len(), 1);

        assert!(chat.send_message(uid, &"ñ".repeat(MAX_CHAT_MESSAGE_LENGTH)).await.is_ok());
    }
}
