//! Page route guards
//!
//! Decides whether a session may open a page of the web surface, and where
//! to send it otherwise.

use serde::Serialize;
use tracing::debug;

use crate::models::user::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Inicio,
    Login,
    Registro,
    DashboardAlumno,
    DashboardCoordinador,
    DashboardAdmin,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Inicio,
        Page::Login,
        Page::Registro,
        Page::DashboardAlumno,
        Page::DashboardCoordinador,
        Page::DashboardAdmin,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Inicio => "/inicio",
            Page::Login => "/login",
            Page::Registro => "/registro",
            Page::DashboardAlumno => "/dashboard-alumno",
            Page::DashboardCoordinador => "/dashboard-coordinador",
            Page::DashboardAdmin => "/dashboard-admin",
        }
    }

    /// Matches the path part of a URL, ignoring query and trailing slash
    pub fn from_path(url: &str) -> Option<Page> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        Page::ALL.into_iter().find(|page| page.path() == path)
    }

    /// Role allowed on a protected page; `None` for public pages
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Page::Inicio | Page::Login | Page::Registro => None,
            Page::DashboardAlumno => Some(Role::Estudiante),
            Page::DashboardCoordinador => Some(Role::Coordinador),
            Page::DashboardAdmin => Some(Role::Admin),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Page),
    Redirect(String),
}

/// Login URL carrying the originally requested URL
pub fn login_redirect(requested: &str) -> String {
    format!("{}?returnUrl={}", Page::Login.path(), urlencoding::encode(requested))
}

/// Resolve `url` for the current session
pub fn check_page(url: &str, user: Option<&User>) -> GuardDecision {
    let Some(page) = Page::from_path(url) else {
        debug!(url = %url, "Unknown page, redirecting home");
        return GuardDecision::Redirect(Page::Inicio.path().to_string());
    };

    let Some(required) = page.required_role() else {
        return GuardDecision::Allow(page);
    };

    match user {
        None => GuardDecision::Redirect(login_redirect(url)),
        Some(user) if user.rol == required => GuardDecision::Allow(page),
        Some(user) => {
            debug!(uid = %user.uid, rol = %user.rol.as_str(), page = %page.path(), "Wrong role for page");
            GuardDecision::Redirect(user.rol.dashboard_path().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(rol: Role) -> User {
        User::new("Ana".to_string(), "ana@ceutec.hn".to_string(), rol)
    }

    #[test]
    fn test_public_pages() {
        assert_eq!(check_page("/login", None), GuardDecision::Allow(Page::Login));
        assert_eq!(check_page("/registro/", None), GuardDecision::Allow(Page::Registro));
        assert_eq!(
            check_page("/inicio", Some(&user(Role::Admin))),
            GuardDecision::Allow(Page::Inicio)
        );
    }

    #[test]
    fn test_root_and_unknown_go_home() {
        let home = GuardDecision::Redirect("/inicio".to_string());
        assert_eq!(check_page("/", None), home);
        assert_eq!(check_page("", None), home);
        assert_eq!(check_page("/no-existe", Some(&user(Role::Estudiante))), home);
    }

    #[test]
    fn test_anonymous_redirected_to_login_with_return_url() {
        assert_eq!(
            check_page("/dashboard-alumno?tab=eventos", None),
            GuardDecision::Redirect("/login?returnUrl=%2Fdashboard-alumno%3Ftab%3Deventos".to_string())
        );
    }

    #[test]
    fn test_role_checks() {
        assert_eq!(
            check_page("/dashboard-coordinador", Some(&user(Role::Coordinador))),
            GuardDecision::Allow(Page::DashboardCoordinador)
        );
        assert_eq!(
            check_page("/dashboard-admin", Some(&user(Role::Estudiante))),
            GuardDecision::Redirect("/dashboard-alumno".to_string())
        );
        assert_eq!(
            check_page("/dashboard-alumno", Some(&user(Role::Admin))),
            GuardDecision::Redirect("/dashboard-admin".to_string())
        );
    }
}
