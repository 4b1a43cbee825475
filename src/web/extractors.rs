//! Request extractors resolving the session behind a bearer token

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::state::AppState;
use crate::models::user::User;
use crate::utils::errors::VincuHubError;

/// Token from `Authorization: Bearer <token>`, if present
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticated user; rejects the request with 401 otherwise
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = VincuHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| VincuHubError::Authentication("Debes iniciar sesión".to_string()))?;
        let user = state.services.auth_service.authenticate(token).await?;
        Ok(Self(user))
    }
}

/// Session user when a valid token is sent; invalid tokens count as anonymous
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = VincuHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.services.auth_service.authenticate(token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(VincuHubError::Authentication(_)) | Err(VincuHubError::Token(_)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}
