//! Authentication service implementation
//!
//! This service handles self-service student registration, password and
//! Google sign-in, admin-side account creation and session tokens.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, debug};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::repositories::UserRepository;
use crate::models::user::{CreateUserRequest, RegisterStudentRequest, Role, User};
use crate::utils::errors::{GoogleError, Result, VincuHubError};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::{log_admin_action, log_user_action};

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub rol: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user plus the token that represents the session
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub redirect: &'static str,
}

/// Subset of Google's tokeninfo response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenInfo {
    pub aud: String,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    settings: Settings,
    http_client: reqwest::Client,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(users: Arc<dyn UserRepository>, settings: Settings) -> Result<Self> {
        let timeout = settings.google.as_ref().map_or(10, |g| g.timeout_seconds);
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        let secret = settings.auth.jwt_secret.as_bytes();

        Ok(Self {
            users,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            settings,
            http_client,
        })
    }

    /// Landing page for a role
    pub fn dashboard_path(rol: Role) -> &'static str {
        rol.dashboard_path()
    }

    /// Hash a password with Argon2id and a random salt
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| VincuHubError::Authentication(format!("No se pudo procesar la contraseña: {}", e)))
    }

    /// Check a password against a stored hash
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }

    /// Sign a session token for `user`
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.uid,
            rol: user.rol,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.settings.auth.token_ttl_hours)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Validate signature and expiry of a session token
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                VincuHubError::Authentication("Sesión inválida o expirada".to_string())
            })
    }

    /// Resolve the user behind a session token
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.decode_token(token)?;
        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| VincuHubError::Authentication("Usuario no encontrado".to_string()))
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        let token = self.issue_token(&user)?;
        Ok(AuthSession {
            redirect: user.rol.dashboard_path(),
            user,
            token,
        })
    }

    fn validate_credentials(&self, nombre: &str, correo: &str, password: &str) -> Result<()> {
        if nombre.trim().is_empty() {
            return Err(VincuHubError::invalid("El nombre es obligatorio"));
        }
        if !is_valid_email(correo) {
            return Err(VincuHubError::invalid("Correo electrónico inválido"));
        }
        if password.chars().count() < self.settings.auth.min_password_length {
            return Err(VincuHubError::invalid(format!(
                "La contraseña debe tener al menos {} caracteres",
                self.settings.auth.min_password_length
            )));
        }
        Ok(())
    }

    async fn ensure_email_available(&self, correo: &str) -> Result<()> {
        if self.users.find_by_email(correo).await?.is_some() {
            return Err(VincuHubError::EmailTaken);
        }
        Ok(())
    }

    /// Public registration, always as a student
    pub async fn register_student(&self, data: RegisterStudentRequest) -> Result<AuthSession> {
        self.validate_credentials(&data.nombre, &data.correo, &data.password)?;
        self.ensure_email_available(&data.correo).await?;

        let mut user = User::new(data.nombre.trim().to_string(), data.correo, Role::Estudiante);
        user.apellido = data.apellido;
        user.carrera = data.carrera;
        user.campus = Some(data.campus.unwrap_or_else(|| self.settings.auth.default_campus.clone()));
        user.universidad = data.universidad;
        user.password_hash = Some(Self::hash_password(&data.password)?);

        let user = self.users.create(&user).await?;
        log_user_action(user.uid, "register", Some(&user.correo));
        self.session(user)
    }

    /// Email and password sign-in
    pub async fn login(&self, correo: &str, password: &str) -> Result<AuthSession> {
        let invalid = || VincuHubError::Authentication("Correo o contraseña incorrectos".to_string());

        let user = self.users.find_by_email(correo).await?.ok_or_else(invalid)?;
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !Self::verify_password(password, hash) {
            warn!(uid = %user.uid, "Failed login attempt");
            return Err(invalid());
        }

        log_user_action(user.uid, "login", None);
        self.session(user)
    }

    /// Validate a Google ID token with the tokeninfo endpoint
    pub async fn verify_google_token(&self, id_token: &str) -> Result<GoogleTokenInfo> {
        let google = match self.settings.google {
            Some(ref google) if self.settings.features.google_sign_in => google,
            _ => return Err(GoogleError::Disabled.into()),
        };

        let response = self
            .http_client
            .get(&google.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| GoogleError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GoogleError::InvalidToken(format!("HTTP {}", status)).into());
        }

        let info: GoogleTokenInfo = response
            .json()
            .await
            .map_err(|e| GoogleError::ApiError(e.to_string()))?;

        if info.aud != google.client_id {
            return Err(GoogleError::AudienceMismatch(info.aud).into());
        }
        Ok(info)
    }

    /// Google sign-in: existing subject, then existing email (linked), else a new student
    pub async fn login_with_google(&self, id_token: &str) -> Result<AuthSession> {
        let info = self.verify_google_token(id_token).await?;

        if let Some(user) = self.users.find_by_google_sub(&info.sub).await? {
            log_user_action(user.uid, "login_google", None);
            return self.session(user);
        }

        let correo = info
            .email
            .clone()
            .ok_or_else(|| GoogleError::InvalidToken("El token no incluye correo".to_string()))?;

        if let Some(existing) = self.users.find_by_email(&correo).await? {
            let user = self.users.link_google(existing.uid, &info.sub).await?;
            log_user_action(user.uid, "link_google", Some(&info.sub));
            return self.session(user);
        }

        let nombre = info
            .given_name
            .clone()
            .or_else(|| info.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Usuario".to_string());
        let mut user = User::new(nombre, correo, Role::Estudiante);
        user.apellido = info.family_name.clone().filter(|_| info.given_name.is_some());
        user.foto_url = info.picture.clone();
        user.campus = Some(self.settings.auth.default_campus.clone());
        user.google_sub = Some(info.sub.clone());

        let user = self.users.create(&user).await?;
        info!(uid = %user.uid, "Created account from Google sign-in");
        log_user_action(user.uid, "register_google", Some(&user.correo));
        self.session(user)
    }

    /// Admin-side creation of coordinator and admin accounts
    pub async fn create_user(&self, actor: &User, data: CreateUserRequest) -> Result<User> {
        actor.ensure_role(&[Role::Admin], "Solo los administradores pueden crear usuarios")?;
        if data.rol == Role::Estudiante {
            return Err(VincuHubError::invalid(
                "Los estudiantes se registran desde la página de registro público",
            ));
        }
        self.validate_credentials(&data.nombre, &data.correo, &data.password)?;
        self.ensure_email_available(&data.correo).await?;

        let mut user = User::new(data.nombre.trim().to_string(), data.correo, data.rol);
        user.apellido = data.apellido;
        user.carrera = data.carrera;
        user.campus = data.campus;
        user.universidad = data.universidad;
        user.password_hash = Some(Self::hash_password(&data.password)?);

        let user = self.users.create(&user).await?;
        log_admin_action(actor.uid, "create_user", Some(&user.correo), Some(user.rol.as_str()));
        Ok(user)
    }

    /// Sessions are stateless tokens; logging out only records the action
    pub fn logout(&self, user: &User) {
        log_user_action(user.uid, "logout", None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = AuthService::hash_password("secreto123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("secreto123", &hash));
        assert!(!AuthService::verify_password("otro", &hash));
        assert!(!AuthService::verify_password("secreto123", "not-a-hash"));
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(AuthService::dashboard_path(Role::Estudiante), "/dashboard-alumno");
        assert_eq!(AuthService::dashboard_path(Role::Coordinador), "/dashboard-coordinador");
        assert_eq!(AuthService::dashboard_path(Role::Admin), "/dashboard-admin");
    }
}
