//! User model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{Result, VincuHubError};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Estudiante,
    Coordinador,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Estudiante, Role::Coordinador, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Estudiante => "estudiante",
            Role::Coordinador => "coordinador",
            Role::Admin => "admin",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Role::Estudiante => "Estudiante",
            Role::Coordinador => "Coordinador",
            Role::Admin => "Admin",
        }
    }

    /// Landing page for this role
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Estudiante => "/dashboard-alumno",
            Role::Coordinador => "/dashboard-coordinador",
            Role::Admin => "/dashboard-admin",
        }
    }

    /// Coordinators and admins manage events, attendance and forums
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Coordinador | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = VincuHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "estudiante" => Ok(Role::Estudiante),
            "coordinador" => Ok(Role::Coordinador),
            "admin" => Ok(Role::Admin),
            other => Err(VincuHubError::invalid(format!("Rol desconocido: {}", other))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = VincuHubError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub uid: Uuid,
    pub nombre: String,
    pub apellido: Option<String>,
    pub correo: String,
    #[sqlx(try_from = "String")]
    pub rol: Role,
    pub carrera: Option<String>,
    pub campus: Option<String>,
    pub universidad: Option<String>,
    pub foto_url: Option<String>,
    pub horas_vinculacion_total: i32,
    #[serde(skip)]
    pub password_hash: Option<String>,
    #[serde(skip)]
    pub google_sub: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh account with zero credited hours
    pub fn new(nombre: String, correo: String, rol: Role) -> Self {
        let now = Utc::now();
        Self {
            uid: Uuid::new_v4(),
            nombre,
            apellido: None,
            correo: correo.trim().to_lowercase(),
            rol,
            carrera: None,
            campus: None,
            universidad: None,
            foto_url: None,
            horas_vinculacion_total: 0,
            password_hash: None,
            google_sub: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "Nombre Apellido", trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido.as_deref().unwrap_or(""))
            .trim()
            .to_string()
    }

    /// Fail with `message` unless the user holds one of `roles`
    pub fn ensure_role(&self, roles: &[Role], message: &str) -> Result<()> {
        if roles.contains(&self.rol) {
            Ok(())
        } else {
            Err(VincuHubError::forbidden(message))
        }
    }
}

/// Public self-registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterStudentRequest {
    pub nombre: String,
    pub apellido: Option<String>,
    pub correo: String,
    pub password: String,
    pub carrera: Option<String>,
    pub campus: Option<String>,
    pub universidad: Option<String>,
}

/// Admin-side account creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub nombre: String,
    pub apellido: Option<String>,
    pub correo: String,
    pub password: String,
    pub rol: Role,
    pub carrera: Option<String>,
    pub campus: Option<String>,
    pub universidad: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub carrera: Option<String>,
    pub campus: Option<String>,
    pub universidad: Option<String>,
    pub foto_url: Option<String>,
    pub rol: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: i64,
    pub estudiantes: i64,
    pub coordinadores: i64,
    pub admins: i64,
}

impl UserStats {
    /// Tally a list of users by role
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        users.into_iter().fold(UserStats::default(), |mut stats, user| {
            stats.total += 1;
            match user.rol {
                Role::Estudiante => stats.estudiantes += 1,
                Role::Coordinador => stats.coordinadores += 1,
                Role::Admin => stats.admins += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionCheck {
    pub can_delete: bool,
    pub reason: Option<String>,
}
