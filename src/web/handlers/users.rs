//! Account administration and profile endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::user::{CreateUserRequest, DeletionCheck, Role, UpdateUserRequest, User, UserStats};
use crate::utils::errors::{Result, VincuHubError};
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub rol: Option<Role>,
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>> {
    let users = &state.services.user_service;
    let list = match filter.rol {
        Some(rol) => users.list_users_by_role(&actor, rol).await?,
        None => users.list_users(&actor).await?,
    };
    Ok(Json(list))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(data): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.services.auth_service.create_user(&actor, data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn user_stats(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<UserStats>> {
    actor.ensure_role(&[Role::Admin], "Solo los administradores pueden ver las estadísticas")?;
    Ok(Json(state.services.user_service.user_stats().await?))
}

/// Own profile, or anyone's for coordinators and admins
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(uid): Path<Uuid>,
) -> Result<Json<User>> {
    if actor.uid != uid && !actor.rol.is_staff() {
        return Err(VincuHubError::forbidden("No puedes ver el perfil de otro usuario"));
    }
    Ok(Json(state.services.user_service.get_user(uid).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(uid): Path<Uuid>,
    Json(changes): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let user = state.services.user_service.update_profile(&actor, uid, changes).await?;
    Ok(Json(user))
}

pub async fn deletion_check(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(uid): Path<Uuid>,
) -> Result<Json<DeletionCheck>> {
    actor.ensure_role(&[Role::Admin], "Solo los administradores pueden eliminar usuarios")?;
    Ok(Json(state.services.user_service.can_delete_user(uid).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(uid): Path<Uuid>,
) -> Result<StatusCode> {
    state.services.user_service.delete_user(&actor, uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
