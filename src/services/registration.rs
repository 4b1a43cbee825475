//! Registration service implementation
//!
//! Student sign-ups, cancellations, attendance crediting and the student
//! dashboard.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{info, warn, debug};
use uuid::Uuid;

use crate::database::repositories::{EventRepository, RegistrationRepository};
use crate::models::registration::{
    AttendanceOutcome, AttendanceUpdate, DashboardEvent, Registration, RegisteredEvent, StudentDashboard,
    StudentStats, TARGET_HOURS,
};
use crate::models::event::{Event, EventState};
use crate::models::user::{Role, User};
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::logging::{log_event_action, log_user_action};

const STAFF_ONLY: &str = "Solo coordinadores y administradores pueden gestionar asistencia";

#[derive(Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
}

impl RegistrationService {
    pub fn new(registrations: Arc<dyn RegistrationRepository>, events: Arc<dyn EventRepository>) -> Self {
        Self { registrations, events }
    }

    async fn get_event(&self, evento_id: Uuid) -> Result<Event> {
        self.events
            .find_by_id(evento_id)
            .await?
            .ok_or(VincuHubError::EventNotFound { evento_id })
    }

    pub async fn get(&self, id: Uuid) -> Result<Registration> {
        self.registrations
            .find_by_id(id)
            .await?
            .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id: id })
    }

    /// Register a student for an event
    pub async fn register(&self, actor: &User, evento_id: Uuid) -> Result<Registration> {
        actor.ensure_role(&[Role::Estudiante], "Solo los estudiantes pueden inscribirse en eventos")?;

        let event = self.get_event(evento_id).await?;
        if !event.estado.accepts_registrations() {
            return Err(VincuHubError::EventNotOpen { estado: event.estado.label().to_string() });
        }
        if self.is_registered(actor.uid, evento_id).await? {
            return Err(VincuHubError::AlreadyRegistered);
        }
        if event.is_full() {
            return Err(VincuHubError::EventFull);
        }

        let registration = Registration {
            id: Uuid::new_v4(),
            uid: actor.uid,
            evento_id,
            nombre_estudiante: actor.full_name(),
            correo_estudiante: actor.correo.clone(),
            carrera: actor.carrera.clone(),
            fecha_inscripcion: Utc::now(),
            asistencia: false,
            horas_ganadas: 0,
            registrado_por: None,
            fecha_registro_asistencia: None,
            comentarios: None,
        };

        // The repository re-checks capacity and uniqueness atomically
        let registration = self.registrations.register(&registration).await?;
        log_event_action(evento_id, "register", actor.uid, None);
        Ok(registration)
    }

    /// Cancel one's own registration while no attendance is recorded
    pub async fn cancel(&self, actor: &User, id: Uuid) -> Result<Registration> {
        let registration = self.get(id).await?;
        if registration.uid != actor.uid {
            return Err(VincuHubError::forbidden("Solo puedes cancelar tus propias inscripciones"));
        }
        if registration.asistencia {
            return Err(VincuHubError::AttendanceAlreadyRecorded);
        }

        let cancelled = self.registrations.cancel(id).await?;
        log_event_action(cancelled.evento_id, "cancel_registration", actor.uid, None);
        Ok(cancelled)
    }

    pub async fn list_by_event(&self, actor: &User, evento_id: Uuid) -> Result<Vec<Registration>> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], STAFF_ONLY)?;
        self.registrations.list_by_event(evento_id).await
    }

    pub async fn list_by_student(&self, uid: Uuid) -> Result<Vec<Registration>> {
        self.registrations.list_by_student(uid).await
    }

    pub async fn is_registered(&self, uid: Uuid, evento_id: Uuid) -> Result<bool> {
        Ok(self
            .registrations
            .find_by_student_and_event(uid, evento_id)
            .await?
            .is_some())
    }

    /// Credit attendance; the student's total moves by the credit delta
    pub async fn record_attendance(&self, actor: &User, update: AttendanceUpdate) -> Result<AttendanceOutcome> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], STAFF_ONLY)?;
        update.validate()?;

        let outcome = self.registrations.record_attendance(&update, actor.uid).await?;
        info!(
            inscripcion_id = %update.inscripcion_id,
            student = %outcome.registration.uid,
            previous_credit = outcome.previous_credit,
            new_credit = outcome.new_credit,
            total = outcome.student_total,
            "Attendance recorded"
        );
        log_user_action(actor.uid, "record_attendance", Some(&update.inscripcion_id.to_string()));
        Ok(outcome)
    }

    /// Credit several registrations; each one is its own unit of work
    pub async fn record_attendance_many(
        &self,
        actor: &User,
        updates: Vec<AttendanceUpdate>,
    ) -> Result<Vec<AttendanceOutcome>> {
        actor.ensure_role(&[Role::Coordinador, Role::Admin], STAFF_ONLY)?;
        for update in &updates {
            update.validate()?;
        }

        let mut outcomes = Vec::with_capacity(updates.len());
        for update in updates {
            match self.record_attendance(actor, update).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(error = %e, recorded = outcomes.len(), "Batch attendance stopped");
                    return Err(e);
                }
            }
        }
        Ok(outcomes)
    }

    /// Available events, the student's upcoming and completed events, and stats
    pub async fn student_dashboard(&self, student: &User, campus: Option<&str>) -> Result<StudentDashboard> {
        let now = Utc::now();
        let registrations = self.registrations.list_by_student(student.uid).await?;
        let registered_ids: HashSet<Uuid> = registrations.iter().map(|r| r.evento_id).collect();

        let disponibles = self
            .events
            .list_by_state(EventState::Publicado, campus)
            .await?
            .into_iter()
            .map(|evento| {
                let ya_inscrito = registered_ids.contains(&evento.id);
                DashboardEvent::new(evento, ya_inscrito)
            })
            .collect();

        let mut proximos = Vec::new();
        let mut completados = Vec::new();
        let events = try_join_all(registrations.iter().map(|r| self.events.find_by_id(r.evento_id))).await?;
        for (inscripcion, evento) in registrations.iter().zip(events) {
            let Some(evento) = evento else {
                debug!(evento_id = %inscripcion.evento_id, "Registration points to a missing event");
                continue;
            };
            let entry = RegisteredEvent { evento, inscripcion: inscripcion.clone() };
            if entry.evento.is_completed(now) {
                completados.push(entry);
            } else {
                proximos.push(entry);
            }
        }

        let stats = StudentStats {
            horas_totales: student.horas_vinculacion_total,
            eventos_inscritos: proximos.len() as i64,
            eventos_completados: completados.len() as i64,
            horas_pendientes: registrations.iter().filter(|r| !r.asistencia).map(|r| r.horas_ganadas).sum(),
            horas_restantes: (TARGET_HOURS - student.horas_vinculacion_total).max(0),
        };

        Ok(StudentDashboard {
            disponibles,
            proximos,
            completados,
            stats,
        })
    }
}
