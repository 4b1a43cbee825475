//! Chat assistant endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::models::chat::{ChatMessage, ChatReply, FaqEntry, SendChatRequest};
use crate::utils::errors::Result;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub historial: Vec<ChatMessage>,
    pub preguntas_frecuentes: &'static [FaqEntry],
}

pub async fn history(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<ChatView>> {
    let chat = &state.services.chat_service;
    Ok(Json(ChatView {
        historial: chat.history(user.uid).await?,
        preguntas_frecuentes: chat.faqs(),
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SendChatRequest>,
) -> Result<Json<ChatReply>> {
    state.rate_limiter.check_rate_limit(&user)?;
    let reply = state.services.chat_service.send_message(user.uid, &request.contenido).await?;
    Ok(Json(reply))
}

pub async fn clear(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<ChatMessage>>> {
    Ok(Json(state.services.chat_service.clear(user.uid).await?))
}
