//! Page surface guarded by session and role

use axum::{
    extract::OriginalUri,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::middleware::guard::{check_page, GuardDecision, Page};
use crate::models::user::User;
use crate::utils::helpers::initials;
use crate::web::extractors::MaybeUser;

#[derive(Debug, Serialize)]
pub struct PageView {
    pub pagina: Page,
    pub path: &'static str,
    /// Avatar letters for the signed-in user
    pub iniciales: Option<String>,
    pub usuario: Option<User>,
}

/// Serve the page descriptor or redirect according to the guards
pub async fn page(OriginalUri(uri): OriginalUri, MaybeUser(user): MaybeUser) -> Response {
    let requested = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());

    match check_page(requested, user.as_ref()) {
        GuardDecision::Allow(pagina) => Json(PageView {
            pagina,
            path: pagina.path(),
            iniciales: user.as_ref().map(|u| initials(&u.full_name())),
            usuario: user,
        })
        .into_response(),
        GuardDecision::Redirect(location) => Redirect::to(&location).into_response(),
    }
}
