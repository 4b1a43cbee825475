//! Registration repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;

use super::RegistrationRepository;
use crate::models::registration::{apply_credit_delta, AttendanceOutcome, AttendanceUpdate, Registration};
use crate::utils::errors::{Result, VincuHubError};

const REGISTRATION_COLUMNS: &str = "id, uid, evento_id, nombre_estudiante, correo_estudiante, carrera, fecha_inscripcion, \
     asistencia, horas_ganadas, registrado_por, fecha_registro_asistencia, comentarios";

#[derive(Clone, Debug)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn register(&self, registration: &Registration) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        // Capacity guard and increment in one statement; zero capacity is unlimited
        let reserved: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE eventos
            SET inscritos_count = inscritos_count + 1, updated_at = $2
            WHERE id = $1 AND (cupo = 0 OR inscritos_count < cupo)
            RETURNING id
            "#
        )
        .bind(registration.evento_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        if reserved.is_none() {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM eventos WHERE id = $1")
                .bind(registration.evento_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Err(match exists {
                Some(_) => VincuHubError::EventFull,
                None => VincuHubError::EventNotFound { evento_id: registration.evento_id },
            });
        }

        let inserted = sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO inscripciones (id, uid, evento_id, nombre_estudiante, correo_estudiante, carrera,
                                       fecha_inscripcion, asistencia, horas_ganadas, registrado_por,
                                       fecha_registro_asistencia, comentarios)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (uid, evento_id) DO NOTHING
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(registration.id)
        .bind(registration.uid)
        .bind(registration.evento_id)
        .bind(&registration.nombre_estudiante)
        .bind(&registration.correo_estudiante)
        .bind(&registration.carrera)
        .bind(registration.fecha_inscripcion)
        .bind(registration.asistencia)
        .bind(registration.horas_ganadas)
        .bind(registration.registrado_por)
        .bind(registration.fecha_registro_asistencia)
        .bind(&registration.comentarios)
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(created) => {
                tx.commit().await?;
                Ok(created)
            }
            None => {
                tx.rollback().await?;
                Err(VincuHubError::AlreadyRegistered)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn find_by_student_and_event(&self, uid: Uuid, evento_id: Uuid) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE uid = $1 AND evento_id = $2"
        ))
        .bind(uid)
        .bind(evento_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn list_by_event(&self, evento_id: Uuid) -> Result<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE evento_id = $1 ORDER BY fecha_inscripcion ASC"
        ))
        .bind(evento_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    async fn list_by_student(&self, uid: Uuid) -> Result<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE uid = $1 ORDER BY fecha_inscripcion DESC"
        ))
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    async fn cancel(&self, id: Uuid) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id: id })?;

        if current.asistencia {
            tx.rollback().await?;
            return Err(VincuHubError::AttendanceAlreadyRecorded);
        }

        sqlx::query("DELETE FROM inscripciones WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE eventos SET inscritos_count = GREATEST(inscritos_count - 1, 0), updated_at = $2 WHERE id = $1"
        )
        .bind(current.evento_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(current)
    }

    async fn record_attendance(&self, update: &AttendanceUpdate, registrado_por: Uuid) -> Result<AttendanceOutcome> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM inscripciones WHERE id = $1 FOR UPDATE"
        ))
        .bind(update.inscripcion_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id: update.inscripcion_id })?;

        let student_total: Option<(i32,)> = sqlx::query_as(
            "SELECT horas_vinculacion_total FROM users WHERE uid = $1 FOR UPDATE"
        )
        .bind(current.uid)
        .fetch_optional(&mut *tx)
        .await?;
        let (student_total,) = student_total.ok_or(VincuHubError::UserNotFound { uid: current.uid })?;

        let horas = if update.asistencia { update.horas_ganadas } else { 0 };
        let updated = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE inscripciones
            SET asistencia = $2,
                horas_ganadas = $3,
                registrado_por = $4,
                fecha_registro_asistencia = $5,
                comentarios = $6
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(update.inscripcion_id)
        .bind(update.asistencia)
        .bind(horas)
        .bind(registrado_por)
        .bind(Utc::now())
        .bind(&update.comentarios)
        .fetch_one(&mut *tx)
        .await?;

        let previous_credit = current.credit();
        let new_credit = updated.credit();
        let new_total = apply_credit_delta(student_total, previous_credit, new_credit);

        sqlx::query("UPDATE users SET horas_vinculacion_total = $2, updated_at = $3 WHERE uid = $1")
            .bind(current.uid)
            .bind(new_total)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(AttendanceOutcome {
            registration: updated,
            previous_credit,
            new_credit,
            student_total: new_total,
        })
    }

    async fn certified_hours_for_creator(&self, creador_uid: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(i.horas_ganadas), 0)::BIGINT
            FROM inscripciones i
            JOIN eventos e ON e.id = i.evento_id
            WHERE e.creador_uid = $1 AND i.asistencia = TRUE
            "#
        )
        .bind(creador_uid)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }
}
