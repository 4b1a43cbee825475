//! Database service layer
//!
//! Bundles one handle per repository so services can be wired against
//! PostgreSQL or the in-memory store alike.

use std::sync::Arc;

use crate::database::memory::MemoryStore;
use crate::database::repositories::{
    EventRepository, ForumRepository, PgEventRepository, PgForumRepository, PgRegistrationRepository,
    PgUserRepository, RegistrationRepository, UserRepository,
};
use crate::database::DatabasePool;

#[derive(Clone)]
pub struct DatabaseService {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub forums: Arc<dyn ForumRepository>,
    pool: Option<DatabasePool>,
}

impl DatabaseService {
    /// Repositories backed by PostgreSQL
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            events: Arc::new(PgEventRepository::new(pool.clone())),
            registrations: Arc::new(PgRegistrationRepository::new(pool.clone())),
            forums: Arc::new(PgForumRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories sharing one in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            events: store.clone(),
            registrations: store.clone(),
            forums: store,
            pool: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Ping the backing database; the in-memory store is always healthy
    pub async fn health_check(&self) -> bool {
        match self.pool {
            Some(ref pool) => super::health_check(pool).await.is_ok(),
            None => true,
        }
    }
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("persistent", &self.is_persistent())
            .finish()
    }
}
