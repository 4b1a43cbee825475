//! Forum service implementation

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::database::repositories::ForumRepository;
use crate::models::forum::{CreateMessageRequest, Forum, ForumMessage};
use crate::models::user::{Role, User};
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::logging::log_user_action;

const MODERATORS_ONLY: &str = "Solo coordinadores y administradores pueden moderar el foro";

#[derive(Clone)]
pub struct ForumService {
    forums: Arc<dyn ForumRepository>,
}

impl ForumService {
    pub fn new(forums: Arc<dyn ForumRepository>) -> Self {
        Self { forums }
    }

    pub async fn get(&self, foro_id: Uuid) -> Result<Forum> {
        self.forums.find_by_id(foro_id).await?.ok_or(VincuHubError::ForumNotFound)
    }

    pub async fn get_by_event(&self, evento_id: Uuid) -> Result<Forum> {
        self.forums.find_by_event(evento_id).await?.ok_or(VincuHubError::ForumNotFound)
    }

    pub async fn post_message(&self, actor: &User, foro_id: Uuid, request: CreateMessageRequest) -> Result<ForumMessage> {
        let contenido = request.normalized()?;
        let forum = self.get(foro_id).await?;
        if forum.cerrado {
            return Err(VincuHubError::ForumClosed);
        }

        let message = ForumMessage {
            id: Uuid::new_v4(),
            foro_id,
            uid: actor.uid,
            nombre_usuario: actor.full_name(),
            rol_usuario: actor.rol,
            foto_usuario: actor.foto_url.clone(),
            contenido,
            fecha: Utc::now(),
            editado: false,
            eliminado: false,
        };

        let message = self.forums.add_message(&message).await?;
        log_user_action(actor.uid, "forum_post", Some(&foro_id.to_string()));
        Ok(message)
    }

    /// Visible messages, oldest first
    pub async fn list_messages(&self, foro_id: Uuid) -> Result<Vec<ForumMessage>> {
        self.get(foro_id).await?;
        self.forums.list_messages(foro_id).await
    }

    pub async fn delete_message(&self, actor: &User, foro_id: Uuid, mensaje_id: Uuid) -> Result<ForumMessage> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], MODERATORS_ONLY)?;
        let message = self.forums.soft_delete_message(foro_id, mensaje_id).await?;
        info!(foro_id = %foro_id, mensaje_id = %mensaje_id, moderator = %actor.uid, "Forum message removed");
        Ok(message)
    }

    /// Close or reopen a forum
    pub async fn set_closed(&self, actor: &User, foro_id: Uuid, cerrado: bool) -> Result<Forum> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], MODERATORS_ONLY)?;
        let forum = self.forums.set_closed(foro_id, cerrado).await?;
        info!(foro_id = %foro_id, cerrado = cerrado, moderator = %actor.uid, "Forum state changed");
        Ok(forum)
    }
}
