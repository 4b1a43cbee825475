//! Password and Google sign-in tests

mod helpers;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::*;
use vincuhub::config::settings::GoogleConfig;
use vincuhub::models::user::{CreateUserRequest, Role};
use vincuhub::utils::errors::GoogleError;
use vincuhub::VincuHubError;

const CLIENT_ID: &str = "vincuhub-test.apps.googleusercontent.com";

fn google_context(server: &MockServer) -> TestContext {
    let tokeninfo_url = format!("{}/tokeninfo", server.uri());
    TestContext::with_settings(|settings| {
        settings.features.google_sign_in = true;
        settings.google = Some(GoogleConfig {
            client_id: CLIENT_ID.to_string(),
            tokeninfo_url,
            timeout_seconds: 5,
        });
    })
}

async fn mount_tokeninfo(server: &MockServer, id_token: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("id_token", id_token))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_register_student_and_login() {
    let ctx = TestContext::new();
    let auth = &ctx.services.auth_service;
    let correo = unique_email("ana");

    let session = auth.register_student(register_request(&correo)).await.unwrap();
    assert_eq!(session.user.rol, Role::Estudiante);
    assert_eq!(session.user.campus.as_deref(), Some("Ceutec"));
    assert_eq!(session.user.horas_vinculacion_total, 0);
    assert_eq!(session.redirect, "/dashboard-alumno");

    let user = auth.authenticate(&session.token).await.unwrap();
    assert_eq!(user.uid, session.user.uid);

    let login = auth.login(&correo, TEST_PASSWORD).await.unwrap();
    assert_eq!(login.user.uid, session.user.uid);

    assert_matches!(
        auth.login(&correo, "incorrecta").await,
        Err(VincuHubError::Authentication(_))
    );
    assert_matches!(
        auth.login("nadie@ceutec.hn", TEST_PASSWORD).await,
        Err(VincuHubError::Authentication(_))
    );
}

#[tokio::test]
async fn test_registration_validation() {
    let ctx = TestContext::new();
    let auth = &ctx.services.auth_service;
    let correo = unique_email("luis");
    auth.register_student(register_request(&correo)).await.unwrap();

    assert_matches!(
        auth.register_student(register_request(&correo.to_uppercase())).await,
        Err(VincuHubError::EmailTaken)
    );

    let mut short = register_request(&unique_email("corto"));
    short.password = "123".to_string();
    assert_matches!(auth.register_student(short).await, Err(VincuHubError::InvalidInput(_)));

    assert_matches!(
        auth.register_student(register_request("no-es-correo")).await,
        Err(VincuHubError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let ctx = TestContext::new();
    assert_matches!(
        ctx.services.auth_service.authenticate("not.a.token").await,
        Err(VincuHubError::Authentication(_))
    );

    // token for an account that no longer exists
    let ghost = fake_user(Role::Estudiante);
    let token = ctx.token_for(&ghost);
    assert_matches!(
        ctx.services.auth_service.authenticate(&token).await,
        Err(VincuHubError::Authentication(_))
    );
}

#[tokio::test]
async fn test_admin_creates_staff_accounts() {
    let ctx = TestContext::new();
    let admin = ctx.admin().await;
    let coordinator = ctx.coordinator().await;
    let auth = &ctx.services.auth_service;

    let request = |rol| CreateUserRequest {
        nombre: "Marta".to_string(),
        apellido: Some("Reyes".to_string()),
        correo: unique_email("marta"),
        password: TEST_PASSWORD.to_string(),
        rol,
        carrera: None,
        campus: Some(TEST_CAMPUS.to_string()),
        universidad: None,
    };

    let created = auth.create_user(&admin, request(Role::Coordinador)).await.unwrap();
    assert_eq!(created.rol, Role::Coordinador);
    assert!(auth.login(&created.correo, TEST_PASSWORD).await.is_ok());

    assert_matches!(
        auth.create_user(&coordinator, request(Role::Coordinador)).await,
        Err(VincuHubError::PermissionDenied(_))
    );
    assert_matches!(
        auth.create_user(&admin, request(Role::Estudiante)).await,
        Err(VincuHubError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_google_sign_in_disabled() {
    let ctx = TestContext::new();
    assert_matches!(
        ctx.services.auth_service.login_with_google("token").await,
        Err(VincuHubError::Google(GoogleError::Disabled))
    );
}

#[tokio::test]
async fn test_google_sign_in_creates_then_reuses_account() {
    let server = MockServer::start().await;
    let ctx = google_context(&server);
    let correo = unique_email("sofia");
    mount_tokeninfo(
        &server,
        "google-token",
        json!({
            "aud": CLIENT_ID,
            "sub": "1122334455",
            "email": correo,
            "name": "Sofía Mejía",
            "given_name": "Sofía",
            "family_name": "Mejía",
            "picture": "https://lh3.googleusercontent.com/a/foto"
        }),
    )
    .await;

    let first = ctx.services.auth_service.login_with_google("google-token").await.unwrap();
    assert_eq!(first.user.rol, Role::Estudiante);
    assert_eq!(first.user.nombre, "Sofía");
    assert_eq!(first.user.apellido.as_deref(), Some("Mejía"));
    assert_eq!(first.user.correo, correo);
    assert!(first.user.foto_url.is_some());

    let second = ctx.services.auth_service.login_with_google("google-token").await.unwrap();
    assert_eq!(second.user.uid, first.user.uid);
    assert_eq!(ctx.services.user_service.user_stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_google_sign_in_links_existing_email() {
    let server = MockServer::start().await;
    let ctx = google_context(&server);
    let coordinator = ctx.coordinator().await;
    mount_tokeninfo(
        &server,
        "staff-token",
        json!({ "aud": CLIENT_ID, "sub": "998877", "email": coordinator.correo }),
    )
    .await;

    let session = ctx.services.auth_service.login_with_google("staff-token").await.unwrap();
    assert_eq!(session.user.uid, coordinator.uid);
    assert_eq!(session.user.rol, Role::Coordinador);
    assert_eq!(session.redirect, "/dashboard-coordinador");
}

#[tokio::test]
async fn test_google_sign_in_rejects_foreign_audience_and_bad_tokens() {
    let server = MockServer::start().await;
    let ctx = google_context(&server);
    mount_tokeninfo(
        &server,
        "foreign-token",
        json!({ "aud": "someone-else", "sub": "1", "email": "x@ceutec.hn" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("id_token", "expired-token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_token" })))
        .mount(&server)
        .await;

    assert_matches!(
        ctx.services.auth_service.login_with_google("foreign-token").await,
        Err(VincuHubError::Google(GoogleError::AudienceMismatch(_)))
    );
    assert_matches!(
        ctx.services.auth_service.login_with_google("expired-token").await,
        Err(VincuHubError::Google(GoogleError::InvalidToken(_)))
    );
}
