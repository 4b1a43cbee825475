//! Certificate download endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use uuid::Uuid;

use crate::services::Certificate;
use crate::utils::errors::Result;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;

/// Certificate with the PDF inlined as base64, for batch downloads
#[derive(Debug, Serialize)]
pub struct EncodedCertificate {
    pub inscripcion_id: Uuid,
    pub file_name: String,
    pub codigo: String,
    pub pdf_base64: String,
}

impl From<Certificate> for EncodedCertificate {
    fn from(certificate: Certificate) -> Self {
        Self {
            inscripcion_id: certificate.inscripcion_id,
            pdf_base64: STANDARD.encode(&certificate.bytes),
            file_name: certificate.file_name,
            codigo: certificate.codigo,
        }
    }
}

/// PDF attachment for one registration
pub async fn download(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(inscripcion_id): Path<Uuid>,
) -> Result<Response> {
    let certificate = state
        .services
        .certificate_service
        .certificate_for(&actor, inscripcion_id)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", certificate.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        certificate.bytes,
    )
        .into_response())
}

pub async fn for_event(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(evento_id): Path<Uuid>,
) -> Result<Json<Vec<EncodedCertificate>>> {
    let certificates = state
        .services
        .certificate_service
        .certificates_for_event(&actor, evento_id)
        .await?;
    Ok(Json(certificates.into_iter().map(EncodedCertificate::from).collect()))
}
