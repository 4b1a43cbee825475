//! Forum model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::Role;
use crate::utils::errors::{Result, VincuHubError};

pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const DELETED_MESSAGE_TEXT: &str = "[Mensaje eliminado por el moderador]";
pub const FORUM_DESCRIPTION: &str = "Espacio para comentarios y preguntas sobre este evento";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Forum {
    pub id: Uuid,
    pub evento_id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub creador_uid: Uuid,
    pub moderador_uid: Uuid,
    pub fecha_creacion: DateTime<Utc>,
    pub cerrado: bool,
    pub mensajes_count: i32,
}

impl Forum {
    /// Forum attached to a freshly created event
    pub fn for_event(evento_id: Uuid, titulo_evento: &str, creador_uid: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            evento_id,
            titulo: format!("Foro: {}", titulo_evento),
            descripcion: FORUM_DESCRIPTION.to_string(),
            creador_uid,
            moderador_uid: creador_uid,
            fecha_creacion: Utc::now(),
            cerrado: false,
            mensajes_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumMessage {
    pub id: Uuid,
    pub foro_id: Uuid,
    pub uid: Uuid,
    pub nombre_usuario: String,
    #[sqlx(try_from = "String")]
    pub rol_usuario: Role,
    pub foto_usuario: Option<String>,
    pub contenido: String,
    pub fecha: DateTime<Utc>,
    pub editado: bool,
    pub eliminado: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub contenido: String,
}

impl CreateMessageRequest {
    /// Trimmed content, rejecting empty or oversized messages
    pub fn normalized(&self) -> Result<String> {
        let contenido = self.contenido.trim();
        if contenido.is_empty() {
            return Err(VincuHubError::invalid("El mensaje no puede estar vacío"));
        }
        if contenido.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(VincuHubError::invalid(format!(
                "El mensaje no puede exceder {} caracteres",
                MAX_MESSAGE_LENGTH
            )));
        }
        Ok(contenido.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetClosedRequest {
    pub cerrado: bool,
}
