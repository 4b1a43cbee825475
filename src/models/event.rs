//! Event model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{Result, VincuHubError};

/// Event lifecycle label. Transitions between labels are unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Borrador,
    Publicado,
    EnCurso,
    Finalizado,
    Cancelado,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Borrador => "borrador",
            EventState::Publicado => "publicado",
            EventState::EnCurso => "en_curso",
            EventState::Finalizado => "finalizado",
            EventState::Cancelado => "cancelado",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventState::Borrador => "Borrador",
            EventState::Publicado => "Publicado",
            EventState::EnCurso => "En Curso",
            EventState::Finalizado => "Finalizado",
            EventState::Cancelado => "Cancelado",
        }
    }

    /// Counted as active on the coordinator dashboard
    pub fn is_active(&self) -> bool {
        matches!(self, EventState::Publicado | EventState::EnCurso)
    }

    /// Students may register while the event is published or running
    pub fn accepts_registrations(&self) -> bool {
        self.is_active()
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = VincuHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "borrador" => Ok(EventState::Borrador),
            "publicado" => Ok(EventState::Publicado),
            "en_curso" => Ok(EventState::EnCurso),
            "finalizado" => Ok(EventState::Finalizado),
            "cancelado" => Ok(EventState::Cancelado),
            other => Err(VincuHubError::invalid(format!("Estado de evento desconocido: {}", other))),
        }
    }
}

impl TryFrom<String> for EventState {
    type Error = VincuHubError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Feria,
    Voluntariado,
    Conferencia,
    Taller,
    Otro,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Feria => "feria",
            EventType::Voluntariado => "voluntariado",
            EventType::Conferencia => "conferencia",
            EventType::Taller => "taller",
            EventType::Otro => "otro",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::Feria => "Feria",
            EventType::Voluntariado => "Voluntariado",
            EventType::Conferencia => "Conferencia",
            EventType::Taller => "Taller",
            EventType::Otro => "Otro",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = VincuHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "feria" => Ok(EventType::Feria),
            "voluntariado" => Ok(EventType::Voluntariado),
            "conferencia" => Ok(EventType::Conferencia),
            "taller" => Ok(EventType::Taller),
            "otro" => Ok(EventType::Otro),
            other => Err(VincuHubError::invalid(format!("Tipo de evento desconocido: {}", other))),
        }
    }
}

impl TryFrom<String> for EventType {
    type Error = VincuHubError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub fecha: DateTime<Utc>,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub ubicacion: String,
    pub campus: String,
    pub facultad: String,
    /// Zero means unlimited
    pub cupo: i32,
    #[sqlx(try_from = "String")]
    pub tipo: EventType,
    pub creador_uid: Uuid,
    pub creador_nombre: Option<String>,
    pub imagen_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub estado: EventState,
    pub inscritos_count: i32,
    pub foro_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the registrant counter reached capacity
    pub fn is_full(&self) -> bool {
        self.cupo > 0 && self.inscritos_count >= self.cupo
    }

    /// Remaining seats, `None` when capacity is unlimited
    pub fn available_seats(&self) -> Option<i32> {
        (self.cupo > 0).then(|| (self.cupo - self.inscritos_count).max(0))
    }

    /// Finished events and events whose date has passed
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        self.estado == EventState::Finalizado || self.fecha < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub titulo: String,
    pub descripcion: String,
    pub fecha: DateTime<Utc>,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub ubicacion: String,
    pub campus: String,
    pub facultad: String,
    pub cupo: i32,
    pub tipo: EventType,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<()> {
        if self.titulo.trim().is_empty() {
            return Err(VincuHubError::invalid("El título es obligatorio"));
        }
        if self.ubicacion.trim().is_empty() || self.campus.trim().is_empty() {
            return Err(VincuHubError::invalid("La ubicación y el campus son obligatorios"));
        }
        validate_schedule(&self.hora_inicio, &self.hora_fin)?;
        validate_capacity(self.cupo)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub fecha: Option<DateTime<Utc>>,
    pub hora_inicio: Option<String>,
    pub hora_fin: Option<String>,
    pub ubicacion: Option<String>,
    pub campus: Option<String>,
    pub facultad: Option<String>,
    pub cupo: Option<i32>,
    pub tipo: Option<EventType>,
    /// Set from a compressed upload, never from the request body
    #[serde(skip_deserializing)]
    pub imagen_url: Option<String>,
}

impl UpdateEventRequest {
    /// Validate the changes against the event they will be applied to
    pub fn validate_against(&self, current: &Event) -> Result<()> {
        if let Some(ref titulo) = self.titulo {
            if titulo.trim().is_empty() {
                return Err(VincuHubError::invalid("El título es obligatorio"));
            }
        }
        let inicio = self.hora_inicio.as_deref().unwrap_or(&current.hora_inicio);
        let fin = self.hora_fin.as_deref().unwrap_or(&current.hora_fin);
        validate_schedule(inicio, fin)?;
        if let Some(cupo) = self.cupo {
            validate_capacity(cupo)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStateRequest {
    pub estado: EventState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub total_eventos: i64,
    pub eventos_activos: i64,
    pub total_inscritos: i64,
    pub horas_certificadas: i64,
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| VincuHubError::invalid(format!("Hora inválida (HH:MM): {}", value)))
}

fn validate_schedule(inicio: &str, fin: &str) -> Result<()> {
    if parse_time(fin)? <= parse_time(inicio)? {
        return Err(VincuHubError::invalid("La hora de fin debe ser posterior a la hora de inicio"));
    }
    Ok(())
}

fn validate_capacity(cupo: i32) -> Result<()> {
    if cupo < 0 {
        return Err(VincuHubError::invalid("El cupo no puede ser negativo"));
    }
    Ok(())
}
