//! Repository tests against a real PostgreSQL instance
//!
//! Run with `cargo test -- --ignored`; needs Docker or `TEST_DATABASE_URL`.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::*;
use vincuhub::database::UserRepository;
use vincuhub::models::forum::CreateMessageRequest;
use vincuhub::models::user::Role;
use vincuhub::services::{AuthService, ServiceFactory};
use vincuhub::VincuHubError;

async fn setup() -> (TestDatabase, ServiceFactory) {
    let database = TestDatabase::new().await.expect("Failed to set up test database");
    database.cleanup().await.expect("Failed to clean test database");

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let settings = test_settings(&temp_dir);
    let services = ServiceFactory::new(&settings, database.service(), None).expect("Failed to build services");
    (database, services)
}

async fn persist_user(database: &TestDatabase, rol: Role) -> vincuhub::models::user::User {
    let mut user = fake_user(rol);
    user.password_hash = Some(AuthService::hash_password(TEST_PASSWORD).unwrap());
    database.service().users.create(&user).await.unwrap()
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_registration_and_attendance() {
    let (database, services) = setup().await;
    let coordinator = persist_user(&database, Role::Coordinador).await;
    let student = persist_user(&database, Role::Estudiante).await;
    let late = persist_user(&database, Role::Estudiante).await;

    let event = services
        .event_service
        .create_event(&coordinator, event_request(1, 5), None)
        .await
        .unwrap();
    assert!(event.foro_id.is_some());

    let registration = services.registration_service.register(&student, event.id).await.unwrap();
    assert_matches!(
        services.registration_service.register(&student, event.id).await,
        Err(VincuHubError::AlreadyRegistered) | Err(VincuHubError::EventFull)
    );
    assert_matches!(
        services.registration_service.register(&late, event.id).await,
        Err(VincuHubError::EventFull)
    );
    assert_eq!(services.event_service.get_event(event.id).await.unwrap().inscritos_count, 1);

    services
        .registration_service
        .record_attendance(&coordinator, attendance(registration.id, true, 6))
        .await
        .unwrap();
    services
        .registration_service
        .record_attendance(&coordinator, attendance(registration.id, true, 4))
        .await
        .unwrap();
    let student = services.user_service.get_user(student.uid).await.unwrap();
    assert_eq!(student.horas_vinculacion_total, 4);

    let stats = services.event_service.coordinator_stats(coordinator.uid).await.unwrap();
    assert_eq!(stats.horas_certificadas, 4);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_users_and_forum() {
    let (database, services) = setup().await;
    let admin = persist_user(&database, Role::Admin).await;
    let coordinator = persist_user(&database, Role::Coordinador).await;

    let found = services
        .user_service
        .get_user_by_email(&coordinator.correo.to_uppercase())
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.uid), Some(coordinator.uid));

    let duplicate = fake_user(Role::Estudiante);
    let mut same_email = fake_user(Role::Estudiante);
    same_email.correo = duplicate.correo.clone();
    database.service().users.create(&duplicate).await.unwrap();
    assert_matches!(
        database.service().users.create(&same_email).await,
        Err(VincuHubError::EmailTaken)
    );

    assert_matches!(
        services.user_service.delete_user(&admin, admin.uid).await,
        Err(VincuHubError::LastAdmin)
    );

    let event = services
        .event_service
        .create_event(&coordinator, event_request(0, 2), None)
        .await
        .unwrap();
    let foro_id = event.foro_id.unwrap();
    let posted = services
        .forum_service
        .post_message(&admin, foro_id, CreateMessageRequest { contenido: "Bienvenidos".to_string() })
        .await
        .unwrap();
    services
        .forum_service
        .delete_message(&coordinator, foro_id, posted.id)
        .await
        .unwrap();
    assert!(services.forum_service.list_messages(foro_id).await.unwrap().is_empty());

    assert_matches!(
        services.user_service.delete_user(&admin, coordinator.uid).await,
        Err(VincuHubError::UserHasEvents)
    );
    assert!(services.user_service.get_user(coordinator.uid).await.is_ok());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_concurrent_admin_deletions_keep_one_admin() {
    let (database, services) = setup().await;
    let first = persist_user(&database, Role::Admin).await;
    let second = persist_user(&database, Role::Admin).await;
    let users = services.user_service.clone();

    let (a, b) = tokio::join!(
        users.delete_user(&first, second.uid),
        services.user_service.delete_user(&second, first.uid)
    );

    assert!(a.is_ok() ^ b.is_ok());
    assert!(matches!(a, Err(VincuHubError::LastAdmin)) || matches!(b, Err(VincuHubError::LastAdmin)));
    assert_eq!(database.service().users.count_by_role(Role::Admin).await.unwrap(), 1);
}
