//! Sign-up, sign-in and session endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::models::user::{RegisterStudentRequest, User};
use crate::services::AuthSession;
use crate::utils::errors::Result;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub correo: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterStudentRequest>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = state.services.auth_service.register_student(data).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(State(state): State<AppState>, Json(data): Json<LoginRequest>) -> Result<Json<AuthSession>> {
    let correo = data.correo.trim().to_lowercase();
    let session = state.services.auth_service.login(&correo, &data.password).await?;
    Ok(Json(session))
}

pub async fn login_with_google(
    State(state): State<AppState>,
    Json(data): Json<GoogleLoginRequest>,
) -> Result<Json<AuthSession>> {
    let session = state.services.auth_service.login_with_google(&data.id_token).await?;
    Ok(Json(session))
}

pub async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> StatusCode {
    state.services.auth_service.logout(&user);
    StatusCode::NO_CONTENT
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
