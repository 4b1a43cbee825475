//! Event repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;

use super::EventRepository;
use crate::models::event::{Event, EventState, UpdateEventRequest};
use crate::models::forum::Forum;
use crate::utils::errors::{Result, VincuHubError};

pub(crate) const EVENT_COLUMNS: &str = "id, titulo, descripcion, fecha, hora_inicio, hora_fin, ubicacion, campus, facultad, \
     cupo, tipo, creador_uid, creador_nombre, imagen_url, estado, inscritos_count, foro_id, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    /// Create a new event and its forum in one transaction
    async fn create_with_forum(&self, event: &Event, forum: &Forum) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO eventos (id, titulo, descripcion, fecha, hora_inicio, hora_fin, ubicacion, campus, facultad,
                                 cupo, tipo, creador_uid, creador_nombre, imagen_url, estado, inscritos_count, foro_id,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.titulo)
        .bind(&event.descripcion)
        .bind(event.fecha)
        .bind(&event.hora_inicio)
        .bind(&event.hora_fin)
        .bind(&event.ubicacion)
        .bind(&event.campus)
        .bind(&event.facultad)
        .bind(event.cupo)
        .bind(event.tipo.as_str())
        .bind(event.creador_uid)
        .bind(&event.creador_nombre)
        .bind(&event.imagen_url)
        .bind(event.estado.as_str())
        .bind(event.inscritos_count)
        .bind(event.foro_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO foros (id, evento_id, titulo, descripcion, creador_uid, moderador_uid, fecha_creacion,
                               cerrado, mensajes_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#
        )
        .bind(forum.id)
        .bind(created.id)
        .bind(&forum.titulo)
        .bind(&forum.descripcion)
        .bind(forum.creador_uid)
        .bind(forum.moderador_uid)
        .bind(forum.fecha_creacion)
        .bind(forum.cerrado)
        .bind(forum.mensajes_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Find event by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM eventos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn list_by_state(&self, estado: EventState, campus: Option<&str>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM eventos
            WHERE estado = $1 AND ($2::TEXT IS NULL OR campus = $2)
            ORDER BY fecha ASC
            "#
        ))
        .bind(estado.as_str())
        .bind(campus)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn list_by_creator(&self, uid: Uuid) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM eventos WHERE creador_uid = $1 ORDER BY fecha DESC"
        ))
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Update event
    async fn update(&self, id: Uuid, changes: &UpdateEventRequest) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE eventos
            SET titulo = COALESCE($2, titulo),
                descripcion = COALESCE($3, descripcion),
                fecha = COALESCE($4, fecha),
                hora_inicio = COALESCE($5, hora_inicio),
                hora_fin = COALESCE($6, hora_fin),
                ubicacion = COALESCE($7, ubicacion),
                campus = COALESCE($8, campus),
                facultad = COALESCE($9, facultad),
                cupo = COALESCE($10, cupo),
                tipo = COALESCE($11, tipo),
                imagen_url = COALESCE($12, imagen_url),
                updated_at = $13
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.titulo)
        .bind(&changes.descripcion)
        .bind(changes.fecha)
        .bind(&changes.hora_inicio)
        .bind(&changes.hora_fin)
        .bind(&changes.ubicacion)
        .bind(&changes.campus)
        .bind(&changes.facultad)
        .bind(changes.cupo)
        .bind(changes.tipo.map(|tipo| tipo.as_str()))
        .bind(&changes.imagen_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VincuHubError::EventNotFound { evento_id: id })
    }

    async fn set_state(&self, id: Uuid, estado: EventState) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE eventos SET estado = $2, updated_at = $3 WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(estado.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VincuHubError::EventNotFound { evento_id: id })
    }
}
