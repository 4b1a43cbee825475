//! Database repositories module
//!
//! Each collection is accessed through an async trait. The PostgreSQL
//! implementations live next to this module; `database::memory` provides
//! the in-memory one.

pub mod user;
pub mod event;
pub mod registration;
pub mod forum;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::*;
use crate::utils::errors::Result;

pub use user::PgUserRepository;
pub use event::PgEventRepository;
pub use registration::PgRegistrationRepository;
pub use forum::PgForumRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, failing with `EmailTaken` on a duplicate email
    async fn create(&self, user: &User) -> Result<User>;

    async fn find_by_id(&self, uid: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, correo: &str) -> Result<Option<User>>;

    async fn find_by_google_sub(&self, google_sub: &str) -> Result<Option<User>>;

    /// Attach a Google subject to an existing account
    async fn link_google(&self, uid: Uuid, google_sub: &str) -> Result<User>;

    /// All accounts, newest first
    async fn list(&self) -> Result<Vec<User>>;

    /// Accounts holding `rol`, newest first
    async fn list_by_role(&self, rol: Role) -> Result<Vec<User>>;

    /// Apply the present fields of `changes`; demoting the only admin fails
    /// with `LastAdmin`
    async fn update(&self, uid: Uuid, changes: &UpdateUserRequest) -> Result<User>;

    /// Returns whether a row was removed. Fails with `LastAdmin` for the
    /// only remaining admin and with `UserHasEvents` for event creators.
    async fn delete(&self, uid: Uuid) -> Result<bool>;

    async fn count_by_role(&self, rol: Role) -> Result<i64>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert an event together with its forum in one atomic write
    async fn create_with_forum(&self, event: &Event, forum: &Forum) -> Result<Event>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    /// Events in `estado`, date ascending, optionally restricted to a campus
    async fn list_by_state(&self, estado: EventState, campus: Option<&str>) -> Result<Vec<Event>>;

    /// Events created by `uid`, date descending
    async fn list_by_creator(&self, uid: Uuid) -> Result<Vec<Event>>;

    async fn update(&self, id: Uuid, changes: &UpdateEventRequest) -> Result<Event>;

    async fn set_state(&self, id: Uuid, estado: EventState) -> Result<Event>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Insert the registration and bump the event counter atomically.
    ///
    /// Fails with `EventNotFound`, `EventFull` or `AlreadyRegistered`; on
    /// failure neither the registration nor the counter is written.
    async fn register(&self, registration: &Registration) -> Result<Registration>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>>;

    async fn find_by_student_and_event(&self, uid: Uuid, evento_id: Uuid) -> Result<Option<Registration>>;

    /// Registrations of an event, oldest first
    async fn list_by_event(&self, evento_id: Uuid) -> Result<Vec<Registration>>;

    /// Registrations of a student, newest first
    async fn list_by_student(&self, uid: Uuid) -> Result<Vec<Registration>>;

    /// Delete a registration without recorded attendance and decrement the
    /// event counter, floored at zero
    async fn cancel(&self, id: Uuid) -> Result<Registration>;

    /// Update the registration and the student's cumulative hours in one
    /// unit, adjusting the total by `new_credit - previous_credit`
    async fn record_attendance(&self, update: &AttendanceUpdate, registrado_por: Uuid) -> Result<AttendanceOutcome>;

    /// Sum of hours credited on events created by `creador_uid`
    async fn certified_hours_for_creator(&self, creador_uid: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait ForumRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Forum>>;

    async fn find_by_event(&self, evento_id: Uuid) -> Result<Option<Forum>>;

    async fn set_closed(&self, id: Uuid, cerrado: bool) -> Result<Forum>;

    /// Append a message and bump the forum's message counter
    async fn add_message(&self, message: &ForumMessage) -> Result<ForumMessage>;

    /// Visible messages, oldest first
    async fn list_messages(&self, foro_id: Uuid) -> Result<Vec<ForumMessage>>;

    /// Flag the message as deleted and replace its content
    async fn soft_delete_message(&self, foro_id: Uuid, mensaje_id: Uuid) -> Result<ForumMessage>;
}
