//! Test context for unified test setup
//!
//! Wires the full service graph against the in-memory store so tests can
//! drive the same code paths the HTTP server uses.

use std::sync::Once;

use tempfile::TempDir;
use uuid::Uuid;

use vincuhub::config::Settings;
use vincuhub::database::{DatabaseService, UserRepository};
use vincuhub::models::event::Event;
use vincuhub::models::registration::Registration;
use vincuhub::models::user::{Role, User};
use vincuhub::services::{AuthService, ServiceFactory};
use vincuhub::web::AppState;

use super::test_data::{event_request, fake_user, TEST_PASSWORD};

static INIT: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("vincuhub=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Settings suitable for tests: in-memory store, log files in a temp dir
pub fn test_settings(temp_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.database.url = "memory://".to_string();
    settings.auth.jwt_secret = "test-secret-with-enough-entropy".to_string();
    settings.logging.file_path = temp_dir.path().join("logs").to_string_lossy().into_owned();
    settings
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub settings: Settings,
    pub database: DatabaseService,
    pub services: ServiceFactory,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    /// Build a context after applying `configure` to the default test settings
    pub fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        init_test_logging();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut settings = test_settings(&temp_dir);
        configure(&mut settings);

        let database = DatabaseService::in_memory();
        let services =
            ServiceFactory::new(&settings, database.clone(), None).expect("Failed to build services");

        Self {
            settings,
            database,
            services,
            temp_dir,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.services.clone(), self.settings.clone())
    }

    /// Persist a user that can log in with `TEST_PASSWORD`
    pub async fn create_user(&self, rol: Role) -> User {
        let mut user = fake_user(rol);
        user.password_hash = Some(AuthService::hash_password(TEST_PASSWORD).expect("Failed to hash password"));
        self.database.users.create(&user).await.expect("Failed to create user")
    }

    pub async fn student(&self) -> User {
        self.create_user(Role::Estudiante).await
    }

    pub async fn coordinator(&self) -> User {
        self.create_user(Role::Coordinador).await
    }

    pub async fn admin(&self) -> User {
        self.create_user(Role::Admin).await
    }

    /// Published event created through the event service
    pub async fn create_event(&self, creator: &User, cupo: i32) -> Event {
        self.create_event_on(creator, cupo, 7).await
    }

    pub async fn create_event_on(&self, creator: &User, cupo: i32, days_ahead: i64) -> Event {
        self.services
            .event_service
            .create_event(creator, event_request(cupo, days_ahead), None)
            .await
            .expect("Failed to create event")
    }

    pub async fn register(&self, student: &User, evento_id: Uuid) -> Registration {
        self.services
            .registration_service
            .register(student, evento_id)
            .await
            .expect("Failed to register student")
    }

    /// Reload a user to observe credited hours
    pub async fn reload_user(&self, uid: Uuid) -> User {
        self.services.user_service.get_user(uid).await.expect("User should exist")
    }

    pub async fn reload_event(&self, id: Uuid) -> Event {
        self.services.event_service.get_event(id).await.expect("Event should exist")
    }

    /// Bearer token for `user`
    pub fn token_for(&self, user: &User) -> String {
        self.services.auth_service.issue_token(user).expect("Failed to issue token")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
