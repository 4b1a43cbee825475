//! Forum repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ForumRepository;
use crate::models::forum::{Forum, ForumMessage, DELETED_MESSAGE_TEXT};
use crate::utils::errors::{Result, VincuHubError};

const FORUM_COLUMNS: &str =
    "id, evento_id, titulo, descripcion, creador_uid, moderador_uid, fecha_creacion, cerrado, mensajes_count";

const MESSAGE_COLUMNS: &str =
    "id, foro_id, uid, nombre_usuario, rol_usuario, foto_usuario, contenido, fecha, editado, eliminado";

#[derive(Clone, Debug)]
pub struct PgForumRepository {
    pool: PgPool,
}

impl PgForumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForumRepository for PgForumRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Forum>> {
        let forum = sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM foros WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(forum)
    }

    async fn find_by_event(&self, evento_id: Uuid) -> Result<Option<Forum>> {
        let forum = sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM foros WHERE evento_id = $1"))
            .bind(evento_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(forum)
    }

    async fn set_closed(&self, id: Uuid, cerrado: bool) -> Result<Forum> {
        sqlx::query_as::<_, Forum>(&format!(
            "UPDATE foros SET cerrado = $2 WHERE id = $1 RETURNING {FORUM_COLUMNS}"
        ))
        .bind(id)
        .bind(cerrado)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VincuHubError::ForumNotFound)
    }

    async fn add_message(&self, message: &ForumMessage) -> Result<ForumMessage> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE foros SET mensajes_count = mensajes_count + 1 WHERE id = $1")
            .bind(message.foro_id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(VincuHubError::ForumNotFound);
        }

        let created = sqlx::query_as::<_, ForumMessage>(&format!(
            r#"
            INSERT INTO mensajes (id, foro_id, uid, nombre_usuario, rol_usuario, foto_usuario, contenido, fecha,
                                  editado, eliminado)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.id)
        .bind(message.foro_id)
        .bind(message.uid)
        .bind(&message.nombre_usuario)
        .bind(message.rol_usuario.as_str())
        .bind(&message.foto_usuario)
        .bind(&message.contenido)
        .bind(message.fecha)
        .bind(message.editado)
        .bind(message.eliminado)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list_messages(&self, foro_id: Uuid) -> Result<Vec<ForumMessage>> {
        let messages = sqlx::query_as::<_, ForumMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM mensajes WHERE foro_id = $1 AND eliminado = FALSE ORDER BY fecha ASC"
        ))
        .bind(foro_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn soft_delete_message(&self, foro_id: Uuid, mensaje_id: Uuid) -> Result<ForumMessage> {
        sqlx::query_as::<_, ForumMessage>(&format!(
            r#"
            UPDATE mensajes
            SET eliminado = TRUE, contenido = $3
            WHERE foro_id = $1 AND id = $2
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(foro_id)
        .bind(mensaje_id)
        .bind(DELETED_MESSAGE_TEXT)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VincuHubError::MessageNotFound { mensaje_id })
    }
}
