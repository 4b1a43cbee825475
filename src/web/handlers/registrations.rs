//! Registration, attendance and student dashboard endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::events::CampusFilter;
use crate::models::registration::{AttendanceOutcome, AttendanceUpdate, Registration, StudentDashboard};
use crate::models::user::Role;
use crate::utils::errors::Result;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(evento_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Registration>)> {
    state.rate_limiter.check_rate_limit(&actor)?;
    let registration = state.services.registration_service.register(&actor, evento_id).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn list_by_event(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(evento_id): Path<Uuid>,
) -> Result<Json<Vec<Registration>>> {
    let registrations = state.services.registration_service.list_by_event(&actor, evento_id).await?;
    Ok(Json(registrations))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Registration>>> {
    Ok(Json(state.services.registration_service.list_by_student(actor.uid).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Registration>> {
    Ok(Json(state.services.registration_service.cancel(&actor, id).await?))
}

pub async fn record_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(update): Json<AttendanceUpdate>,
) -> Result<Json<AttendanceOutcome>> {
    let outcome = state.services.registration_service.record_attendance(&actor, update).await?;
    Ok(Json(outcome))
}

pub async fn record_attendance_batch(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(updates): Json<Vec<AttendanceUpdate>>,
) -> Result<Json<Vec<AttendanceOutcome>>> {
    let outcomes = state
        .services
        .registration_service
        .record_attendance_many(&actor, updates)
        .await?;
    Ok(Json(outcomes))
}

/// Campus defaults to the student's own
pub async fn student_dashboard(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(filter): Query<CampusFilter>,
) -> Result<Json<StudentDashboard>> {
    actor.ensure_role(&[Role::Estudiante], "El panel de estudiante es solo para estudiantes")?;
    let campus = filter.campus.or_else(|| actor.campus.clone());
    let dashboard = state
        .services
        .registration_service
        .student_dashboard(&actor, campus.as_deref())
        .await?;
    Ok(Json(dashboard))
}
