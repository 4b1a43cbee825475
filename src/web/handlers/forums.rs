//! Event forum endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::models::forum::{CreateMessageRequest, Forum, ForumMessage, SetClosedRequest};
use crate::utils::errors::Result;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

pub async fn forum_for_event(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(evento_id): Path<Uuid>,
) -> Result<Json<Forum>> {
    Ok(Json(state.services.forum_service.get_by_event(evento_id).await?))
}

pub async fn get_forum(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(foro_id): Path<Uuid>,
) -> Result<Json<Forum>> {
    Ok(Json(state.services.forum_service.get(foro_id).await?))
}

pub async fn list_messages(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(foro_id): Path<Uuid>,
) -> Result<Json<Vec<ForumMessage>>> {
    Ok(Json(state.services.forum_service.list_messages(foro_id).await?))
}

pub async fn post_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(foro_id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ForumMessage>)> {
    state.rate_limiter.check_rate_limit(&actor)?;
    let message = state.services.forum_service.post_message(&actor, foro_id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((foro_id, mensaje_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ForumMessage>> {
    let message = state.services.forum_service.delete_message(&actor, foro_id, mensaje_id).await?;
    Ok(Json(message))
}

pub async fn set_closed(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(foro_id): Path<Uuid>,
    Json(request): Json<SetClosedRequest>,
) -> Result<Json<Forum>> {
    let forum = state.services.forum_service.set_closed(&actor, foro_id, request.cerrado).await?;
    Ok(Json(forum))
}
