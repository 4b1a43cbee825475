//! Chat assistant tests against a mocked completion endpoint

mod helpers;

use assert_matches::assert_matches;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::*;
use vincuhub::models::chat::ChatRole;
use vincuhub::services::chat::{APOLOGY_MESSAGE, WELCOME_MESSAGE};
use vincuhub::VincuHubError;

const API_KEY: &str = "sk-test";

fn completion_context(server: &MockServer) -> TestContext {
    let api_url = format!("{}/v1/chat/completions", server.uri());
    TestContext::with_settings(|settings| {
        settings.features.chat_completion = true;
        settings.chat.api_key = Some(API_KEY.to_string());
        settings.chat.api_url = api_url;
        settings.chat.timeout_seconds = 2;
    })
}

fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn test_fresh_conversation_starts_with_welcome() {
    let ctx = TestContext::new();
    let history = ctx.services.chat_service.history(Uuid::new_v4()).await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert_eq!(history[0].content, WELCOME_MESSAGE);
    assert_eq!(ctx.services.chat_service.faqs().len(), 5);
}

#[tokio::test]
async fn test_keyword_replies_without_completion() {
    let ctx = TestContext::new();
    let chat = &ctx.services.chat_service;
    let uid = Uuid::new_v4();
    assert!(!chat.is_completion_enabled());

    let reply = chat.send_message(uid, "  ¿Cuántas horas de vinculación necesito?  ").await.unwrap();
    assert!(reply.respuesta.content.contains("60 horas"));
    assert_eq!(reply.historial.len(), 3);
    assert_eq!(reply.historial[1].content, "¿Cuántas horas de vinculación necesito?");
    assert_eq!(reply.historial[1].role, ChatRole::User);

    assert_eq!(chat.history(uid).await.unwrap().len(), 3);
    assert_matches!(chat.send_message(uid, "   ").await, Err(VincuHubError::InvalidInput(_)));
}

#[tokio::test]
async fn test_clear_resets_to_welcome() {
    let ctx = TestContext::new();
    let chat = &ctx.services.chat_service;
    let uid = Uuid::new_v4();
    chat.send_message(uid, "hola").await.unwrap();

    let cleared = chat.clear(uid).await.unwrap();
    assert_eq!(cleared.len(), 1);
    assert_eq!(chat.history(uid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_is_capped() {
    let ctx = TestContext::with_settings(|settings| settings.chat.stored_messages = 4);
    let chat = &ctx.services.chat_service;
    let uid = Uuid::new_v4();

    for pregunta in ["hola", "¿cómo me inscribo?", "¿y los certificados?"] {
        chat.send_message(uid, pregunta).await.unwrap();
    }

    let history = chat.history(uid).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].content, "¿y los certificados?");
}

#[tokio::test]
async fn test_completion_reply_is_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .and(body_partial_json(json!({ "model": "gpt-3.5-turbo", "max_tokens": 500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Ve a la sección Eventos.")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = completion_context(&server);
    let chat = &ctx.services.chat_service;
    assert!(chat.is_completion_enabled());

    let uid = Uuid::new_v4();
    let reply = chat.send_message(uid, "¿Dónde veo eventos?").await.unwrap();
    assert_eq!(reply.respuesta.content, "Ve a la sección Eventos.");
    assert_eq!(reply.historial.len(), 3);

    // system prompt, welcome message, then the new question exactly once
    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["content"], WELCOME_MESSAGE);
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[2]["content"], "¿Dónde veo eventos?");
}

#[tokio::test]
async fn test_completion_failure_replies_with_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let ctx = completion_context(&server);
    let uid = Uuid::new_v4();
    let reply = ctx.services.chat_service.send_message(uid, "hola").await.unwrap();

    assert_eq!(reply.respuesta.content, APOLOGY_MESSAGE);
    assert_eq!(ctx.services.chat_service.history(uid).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_choices_reply_with_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let ctx = completion_context(&server);
    let reply = ctx.services.chat_service.send_message(Uuid::new_v4(), "hola").await.unwrap();
    assert_eq!(reply.respuesta.content, APOLOGY_MESSAGE);
}
