//! Registration (inscripción) model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::Event;
use crate::utils::errors::{Result, VincuHubError};

/// Hours students must accumulate
pub const TARGET_HOURS: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub uid: Uuid,
    pub evento_id: Uuid,
    pub nombre_estudiante: String,
    pub correo_estudiante: String,
    pub carrera: Option<String>,
    pub fecha_inscripcion: DateTime<Utc>,
    pub asistencia: bool,
    pub horas_ganadas: i32,
    pub registrado_por: Option<Uuid>,
    pub fecha_registro_asistencia: Option<DateTime<Utc>>,
    pub comentarios: Option<String>,
}

impl Registration {
    /// Hours this registration currently contributes to the student's total
    pub fn credit(&self) -> i32 {
        credit_for(self.asistencia, self.horas_ganadas)
    }
}

/// Credit granted by an attendance record
pub fn credit_for(asistencia: bool, horas: i32) -> i32 {
    if asistencia {
        horas
    } else {
        0
    }
}

/// New cumulative total after replacing `previous` credit with `next`, floored at zero
pub fn apply_credit_delta(total: i32, previous: i32, next: i32) -> i32 {
    total.saturating_sub(previous).saturating_add(next).max(0)
}

/// Attendance submitted by a coordinator for one registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    pub inscripcion_id: Uuid,
    pub asistencia: bool,
    #[serde(default)]
    pub horas_ganadas: i32,
    pub comentarios: Option<String>,
}

impl AttendanceUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.horas_ganadas < 0 {
            return Err(VincuHubError::invalid("Las horas no pueden ser negativas"));
        }
        Ok(())
    }
}

/// Result of crediting attendance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceOutcome {
    pub registration: Registration,
    pub previous_credit: i32,
    pub new_credit: i32,
    pub student_total: i32,
}

/// Event card on the student dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardEvent {
    pub evento: Event,
    pub ya_inscrito: bool,
    pub lleno: bool,
    /// `None` when capacity is unlimited
    pub cupos_disponibles: Option<i32>,
    pub puede_inscribirse: bool,
    pub boton: String,
}

impl DashboardEvent {
    pub fn new(evento: Event, ya_inscrito: bool) -> Self {
        let lleno = evento.is_full();
        let boton = if ya_inscrito {
            "✅ Ya Inscrito"
        } else if lleno {
            "🚫 Cupo Lleno"
        } else {
            "📝 Inscribirse"
        };
        Self {
            puede_inscribirse: !ya_inscrito && !lleno,
            ya_inscrito,
            lleno,
            cupos_disponibles: evento.available_seats(),
            boton: boton.to_string(),
            evento,
        }
    }
}

/// Registered event paired with the student's registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredEvent {
    pub evento: Event,
    pub inscripcion: Registration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStats {
    pub horas_totales: i32,
    pub eventos_inscritos: i64,
    pub eventos_completados: i64,
    /// Hours recorded on registrations still lacking attendance
    pub horas_pendientes: i32,
    pub horas_restantes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDashboard {
    pub disponibles: Vec<DashboardEvent>,
    pub proximos: Vec<RegisteredEvent>,
    pub completados: Vec<RegisteredEvent>,
    pub stats: StudentStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_rule() {
        assert_eq!(credit_for(true, 4), 4);
        assert_eq!(credit_for(false, 4), 0);
    }

    #[test]
    fn test_delta_is_idempotent_and_floored() {
        // first credit
        assert_eq!(apply_credit_delta(10, 0, 4), 14);
        // same submission again
        assert_eq!(apply_credit_delta(14, 4, 4), 14);
        // correction downwards
        assert_eq!(apply_credit_delta(14, 4, 2), 12);
        // revoked attendance on an inconsistent total
        assert_eq!(apply_credit_delta(1, 4, 0), 0);
    }

    #[test]
    fn test_negative_hours_rejected() {
        let update = AttendanceUpdate {
            inscripcion_id: Uuid::new_v4(),
            asistencia: true,
            horas_ganadas: -1,
            comentarios: None,
        };
        assert!(update.validate().is_err());
    }
}
