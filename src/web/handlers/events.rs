//! Event catalogue and management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::event::{ChangeStateRequest, CoordinatorStats, CreateEventRequest, Event, UpdateEventRequest};
use crate::models::user::Role;
use crate::utils::errors::Result;
use crate::utils::image_compressor::ImageUpload;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CampusFilter {
    pub campus: Option<String>,
}

/// Event payload plus an optional uploaded image as a data URL
#[derive(Debug, Deserialize)]
pub struct EventPayload<T> {
    #[serde(flatten)]
    pub evento: T,
    pub imagen: Option<String>,
}

fn parse_image(imagen: Option<String>) -> Result<Option<ImageUpload>> {
    imagen.as_deref().map(ImageUpload::from_data_url).transpose()
}

pub async fn list_published(
    State(state): State<AppState>,
    Query(filter): Query<CampusFilter>,
) -> Result<Json<Vec<Event>>> {
    let events = state.services.event_service.list_published(filter.campus.as_deref()).await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<EventPayload<CreateEventRequest>>,
) -> Result<(StatusCode, Json<Event>)> {
    let image = parse_image(payload.imagen)?;
    let event = state.services.event_service.create_event(&actor, payload.evento, image).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Event>> {
    Ok(Json(state.services.event_service.get_event(id).await?))
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload<UpdateEventRequest>>,
) -> Result<Json<Event>> {
    let image = parse_image(payload.imagen)?;
    let event = state.services.event_service.update_event(&actor, id, payload.evento, image).await?;
    Ok(Json(event))
}

pub async fn change_state(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStateRequest>,
) -> Result<Json<Event>> {
    let event = state.services.event_service.change_state(&actor, id, request.estado).await?;
    Ok(Json(event))
}

pub async fn cancel_event(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>> {
    Ok(Json(state.services.event_service.cancel_event(&actor, id).await?))
}

/// Events created by the calling coordinator
pub async fn my_events(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<Event>>> {
    actor.ensure_role(&[Role::Coordinador, Role::Admin], "Solo coordinadores y administradores crean eventos")?;
    Ok(Json(state.services.event_service.list_by_coordinator(actor.uid).await?))
}

pub async fn coordinator_stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<CoordinatorStats>> {
    actor.ensure_role(&[Role::Coordinador, Role::Admin], "Solo coordinadores y administradores crean eventos")?;
    Ok(Json(state.services.event_service.coordinator_stats(actor.uid).await?))
}
