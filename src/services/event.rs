//! Event service implementation
//!
//! Coordinators and admins publish events; each new event gets its own
//! discussion forum. Optional images are compressed before storage.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, debug};
use uuid::Uuid;

use crate::database::repositories::{EventRepository, RegistrationRepository};
use crate::models::event::{CoordinatorStats, CreateEventRequest, Event, EventState, UpdateEventRequest};
use crate::models::forum::Forum;
use crate::models::user::{Role, User};
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::image_compressor::{ImageCompressor, ImageUpload};
use crate::utils::logging::log_event_action;

const STAFF_ONLY: &str = "Solo coordinadores y administradores pueden gestionar eventos";

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    compressor: ImageCompressor,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        compressor: ImageCompressor,
    ) -> Self {
        Self {
            events,
            registrations,
            compressor,
        }
    }

    fn compress(&self, image: Option<ImageUpload>) -> Result<Option<String>> {
        image
            .map(|upload| self.compressor.compress(&upload).map(|compressed| compressed.data_url))
            .transpose()
    }

    /// Publish a new event and open its forum
    pub async fn create_event(&self, actor: &User, data: CreateEventRequest, image: Option<ImageUpload>) -> Result<Event> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], STAFF_ONLY)?;
        data.validate()?;

        let imagen_url = self.compress(image)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let titulo = data.titulo.trim().to_string();
        let forum = Forum::for_event(id, &titulo, actor.uid);
        let event = Event {
            id,
            titulo,
            descripcion: data.descripcion,
            fecha: data.fecha,
            hora_inicio: data.hora_inicio,
            hora_fin: data.hora_fin,
            ubicacion: data.ubicacion,
            campus: data.campus,
            facultad: data.facultad,
            cupo: data.cupo,
            tipo: data.tipo,
            creador_uid: actor.uid,
            creador_nombre: Some(actor.full_name()),
            imagen_url,
            estado: EventState::Publicado,
            inscritos_count: 0,
            foro_id: Some(forum.id),
            created_at: now,
            updated_at: now,
        };

        // Event and forum are written together or not at all
        let event = self.events.create_with_forum(&event, &forum).await?;

        log_event_action(event.id, "create", actor.uid, Some(&event.titulo));
        info!(evento_id = %event.id, foro_id = %forum.id, "Event created");
        Ok(event)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event> {
        self.events.find_by_id(id).await?.ok_or(VincuHubError::EventNotFound { evento_id: id })
    }

    /// Published events, soonest first
    pub async fn list_published(&self, campus: Option<&str>) -> Result<Vec<Event>> {
        debug!(campus = ?campus, "Listing published events");
        self.events.list_by_state(EventState::Publicado, campus).await
    }

    /// Events created by a coordinator, latest first
    pub async fn list_by_coordinator(&self, uid: Uuid) -> Result<Vec<Event>> {
        self.events.list_by_creator(uid).await
    }

    /// Load an event the actor may manage: its creator or any admin
    async fn managed_event(&self, actor: &User, id: Uuid) -> Result<Event> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], STAFF_ONLY)?;
        let event = self.get_event(id).await?;
        if actor.rol != Role::Admin && event.creador_uid != actor.uid {
            return Err(VincuHubError::forbidden("Solo el creador del evento o un administrador puede modificarlo"));
        }
        Ok(event)
    }

    pub async fn update_event(
        &self,
        actor: &User,
        id: Uuid,
        mut changes: UpdateEventRequest,
        image: Option<ImageUpload>,
    ) -> Result<Event> {
        let current = self.managed_event(actor, id).await?;
        changes.validate_against(&current)?;
        changes.imagen_url = self.compress(image)?;

        let event = self.events.update(id, &changes).await?;
        log_event_action(id, "update", actor.uid, None);
        Ok(event)
    }

    /// Move the event to any allowed state
    pub async fn change_state(&self, actor: &User, id: Uuid, estado: EventState) -> Result<Event> {
        let current = self.managed_event(actor, id).await?;
        let event = self.events.set_state(id, estado).await?;
        log_event_action(
            id,
            "change_state",
            actor.uid,
            Some(&format!("{} -> {}", current.estado, estado)),
        );
        Ok(event)
    }

    /// Soft delete
    pub async fn cancel_event(&self, actor: &User, id: Uuid) -> Result<Event> {
        self.change_state(actor, id, EventState::Cancelado).await
    }

    pub async fn coordinator_stats(&self, uid: Uuid) -> Result<CoordinatorStats> {
        let events = self.events.list_by_creator(uid).await?;
        let horas_certificadas = self.registrations.certified_hours_for_creator(uid).await?;

        Ok(CoordinatorStats {
            total_eventos: events.len() as i64,
            eventos_activos: events.iter().filter(|e| e.estado.is_active()).count() as i64,
            total_inscritos: events.iter().map(|e| e.inscritos_count as i64).sum(),
            horas_certificadas,
        })
    }
}
