//! User service implementation
//!
//! This service handles account lookups, profile management, role
//! statistics and account deletion rules.

use std::sync::Arc;

use tracing::{info, debug};
use uuid::Uuid;

use crate::database::repositories::{EventRepository, UserRepository};
use crate::models::user::{DeletionCheck, Role, UpdateUserRequest, User, UserStats};
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::logging::{log_admin_action, log_user_action};

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(users: Arc<dyn UserRepository>, events: Arc<dyn EventRepository>) -> Self {
        Self { users, events }
    }

    /// Get user by ID
    pub async fn get_user(&self, uid: Uuid) -> Result<User> {
        debug!(uid = %uid, "Getting user by ID");
        self.users.find_by_id(uid).await?.ok_or(VincuHubError::UserNotFound { uid })
    }

    pub async fn get_user_by_email(&self, correo: &str) -> Result<Option<User>> {
        self.users.find_by_email(correo).await
    }

    pub async fn email_exists(&self, correo: &str) -> Result<bool> {
        Ok(self.users.find_by_email(correo).await?.is_some())
    }

    /// All accounts, newest first
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>> {
        actor.ensure_role(&[Role::Admin], "Solo los administradores pueden ver los usuarios")?;
        self.users.list().await
    }

    pub async fn list_users_by_role(&self, actor: &User, rol: Role) -> Result<Vec<User>> {
        actor.ensure_role(&[Role::Admin], "Solo los administradores pueden ver los usuarios")?;
        self.users.list_by_role(rol).await
    }

    /// Update user profile. Users edit themselves, admins edit anyone, and
    /// only admins change roles.
    pub async fn update_profile(&self, actor: &User, uid: Uuid, changes: UpdateUserRequest) -> Result<User> {
        let is_admin = actor.rol == Role::Admin;
        if actor.uid != uid && !is_admin {
            return Err(VincuHubError::forbidden("No puedes editar el perfil de otro usuario"));
        }
        if changes.rol.is_some() && !is_admin {
            return Err(VincuHubError::forbidden("Solo los administradores pueden cambiar roles"));
        }
        if let Some(ref nombre) = changes.nombre {
            if nombre.trim().is_empty() {
                return Err(VincuHubError::invalid("El nombre es obligatorio"));
            }
        }

        let user = self.users.update(uid, &changes).await?;
        if actor.uid == uid {
            log_user_action(uid, "update_profile", None);
        } else {
            log_admin_action(actor.uid, "update_user", Some(&user.correo), changes.rol.map(|r| r.as_str()));
        }
        Ok(user)
    }

    /// Totals per role
    pub async fn user_stats(&self) -> Result<UserStats> {
        let users = self.users.list().await?;
        Ok(UserStats::from_users(&users))
    }

    /// Whether the account may be deleted. Advisory only; the repository
    /// enforces the same rules when deleting.
    pub async fn can_delete_user(&self, uid: Uuid) -> Result<DeletionCheck> {
        let user = self.get_user(uid).await?;
        let blocker = if user.rol == Role::Admin && self.users.count_by_role(Role::Admin).await? <= 1 {
            Some(VincuHubError::LastAdmin)
        } else if !self.events.list_by_creator(uid).await?.is_empty() {
            Some(VincuHubError::UserHasEvents)
        } else {
            None
        };

        Ok(DeletionCheck {
            can_delete: blocker.is_none(),
            reason: blocker.map(|err| err.to_string()),
        })
    }

    /// Delete an account (admin only)
    pub async fn delete_user(&self, actor: &User, uid: Uuid) -> Result<()> {
        actor.ensure_role(&[Role::Admin], "Solo los administradores pueden eliminar usuarios")?;

        if !self.users.delete(uid).await? {
            return Err(VincuHubError::UserNotFound { uid });
        }
        info!(uid = %uid, "User deleted");
        log_admin_action(actor.uid, "delete_user", Some(&uid.to_string()), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    async fn seeded() -> (UserService, User, User) {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone(), store.clone());
        let admin = UserRepository::create(&*store, &User::new("Root".into(), "root@ceutec.edu".into(), Role::Admin)).await.unwrap();
        let student = UserRepository::create(&*store, &User::new("Ana".into(), "ana@ceutec.edu".into(), Role::Estudiante)).await.unwrap();
        (service, admin, student)
    }

    #[tokio::test]
    async fn test_last_admin_cannot_be_deleted() {
        let (service, admin, _) = seeded().await;

        let check = service.can_delete_user(admin.uid).await.unwrap();
        assert!(!check.can_delete);
        assert_eq!(check.reason.as_deref(), Some("No puedes eliminar el último administrador del sistema"));
        assert!(matches!(service.delete_user(&admin, admin.uid).await, Err(VincuHubError::LastAdmin)));
    }

    #[tokio::test]
    async fn test_student_cannot_change_own_role() {
        let (service, _, student) = seeded().await;
        let changes = UpdateUserRequest { rol: Some(Role::Admin), ..Default::default() };
        let result = service.update_profile(&student, student.uid, changes).await;
        assert!(matches!(result, Err(VincuHubError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_profile_update_keeps_absent_fields() {
        let (service, _, student) = seeded().await;
        let changes = UpdateUserRequest { carrera: Some("Sistemas".into()), ..Default::default() };
        let updated = service.update_profile(&student, student.uid, changes).await.unwrap();
        assert_eq!(updated.carrera.as_deref(), Some("Sistemas"));
        assert_eq!(updated.nombre, "Ana");
    }
}
