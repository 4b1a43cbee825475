//! User repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use chrono::Utc;
use uuid::Uuid;

use super::UserRepository;
use crate::models::user::{User, Role, UpdateUserRequest};
use crate::utils::errors::{Result, VincuHubError};

const USER_COLUMNS: &str = "uid, nombre, apellido, correo, rol, carrera, campus, universidad, foto_url, \
     horas_vinculacion_total, password_hash, google_sub, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (uid, nombre, apellido, correo, rol, carrera, campus, universidad, foto_url,
                               horas_vinculacion_total, password_hash, google_sub, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.uid)
        .bind(&user.nombre)
        .bind(&user.apellido)
        .bind(&user.correo)
        .bind(user.rol.as_str())
        .bind(&user.carrera)
        .bind(&user.campus)
        .bind(&user.universidad)
        .bind(&user.foto_url)
        .bind(user.horas_vinculacion_total)
        .bind(&user.password_hash)
        .bind(&user.google_sub)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(VincuHubError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Find user by ID
    async fn find_by_id(&self, uid: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE uid = $1"))
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by email
    async fn find_by_email(&self, correo: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE correo = $1"))
            .bind(correo.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by Google subject
    async fn find_by_google_sub(&self, google_sub: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE google_sub = $1"))
            .bind(google_sub)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn link_google(&self, uid: Uuid, google_sub: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET google_sub = $2, updated_at = $3 WHERE uid = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(uid)
        .bind(google_sub)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VincuHubError::UserNotFound { uid })
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_by_role(&self, rol: Role) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE rol = $1 ORDER BY created_at DESC"
        ))
        .bind(rol.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update user
    async fn update(&self, uid: Uuid, changes: &UpdateUserRequest) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        if changes.rol.is_some_and(|rol| rol != Role::Admin) {
            let (target_rol, admins) = lock_admins(&mut tx, uid).await?;
            if target_rol.as_deref() == Some(Role::Admin.as_str()) && admins <= 1 {
                return Err(VincuHubError::LastAdmin);
            }
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET nombre = COALESCE($2, nombre),
                apellido = COALESCE($3, apellido),
                carrera = COALESCE($4, carrera),
                campus = COALESCE($5, campus),
                universidad = COALESCE($6, universidad),
                foto_url = COALESCE($7, foto_url),
                rol = COALESCE($8, rol),
                updated_at = $9
            WHERE uid = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(uid)
        .bind(&changes.nombre)
        .bind(&changes.apellido)
        .bind(&changes.carrera)
        .bind(&changes.campus)
        .bind(&changes.universidad)
        .bind(&changes.foto_url)
        .bind(changes.rol.map(|rol| rol.as_str()))
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(VincuHubError::UserNotFound { uid })?;

        tx.commit().await?;
        Ok(user)
    }

    /// Delete user
    async fn delete(&self, uid: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let (target_rol, admins) = lock_admins(&mut tx, uid).await?;
        let Some(target_rol) = target_rol else {
            return Ok(false);
        };
        if target_rol == Role::Admin.as_str() && admins <= 1 {
            return Err(VincuHubError::LastAdmin);
        }

        let (has_events,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM eventos WHERE creador_uid = $1)")
            .bind(uid)
            .fetch_one(&mut *tx)
            .await?;
        if has_events {
            return Err(VincuHubError::UserHasEvents);
        }

        let result = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_role(&self, rol: Role) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE rol = $1")
            .bind(rol.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

/// Lock every admin row plus the target row, then report the target's role
/// and how many admins remain. Concurrent role changes and deletions queue
/// behind these locks.
async fn lock_admins(tx: &mut Transaction<'_, Postgres>, uid: Uuid) -> Result<(Option<String>, usize)> {
    let admins: Vec<(Uuid,)> = sqlx::query_as("SELECT uid FROM users WHERE rol = $1 FOR UPDATE")
        .bind(Role::Admin.as_str())
        .fetch_all(&mut **tx)
        .await?;

    let target: Option<(String,)> = sqlx::query_as("SELECT rol FROM users WHERE uid = $1 FOR UPDATE")
        .bind(uid)
        .fetch_optional(&mut **tx)
        .await?;

    Ok((target.map(|(rol,)| rol), admins.len()))
}
