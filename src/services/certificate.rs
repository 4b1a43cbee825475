//! Participation certificate service
//!
//! Renders A4 landscape PDF certificates for students whose attendance was
//! credited on a finished event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::settings::CertificateConfig;
use crate::database::repositories::{EventRepository, RegistrationRepository};
use crate::models::event::{Event, EventState};
use crate::models::registration::Registration;
use crate::models::user::{Role, User};
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::helpers::{format_date_es, generate_random_digits, sanitize_filename, wrap_text};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;

/// Points to millimetres
const PT_TO_MM: f32 = 0.3528;

/// Average glyph width of the builtin Helvetica/Times faces, in ems
const AVG_GLYPH_EM: f32 = 0.5;

/// Characters per line of the wrapped event title
const TITLE_WRAP_CHARS: usize = 60;

const BLUE: (f32, f32, f32) = (0.0, 0.4, 0.8);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const DARK_GREY: (f32, f32, f32) = (0.24, 0.24, 0.24);
const GREY: (f32, f32, f32) = (0.4, 0.4, 0.4);
const LIGHT_GREY: (f32, f32, f32) = (0.47, 0.47, 0.47);

/// Everything printed on a certificate
#[derive(Debug, Clone, Serialize)]
pub struct CertificateData {
    pub nombre_estudiante: String,
    pub nombre_evento: String,
    pub horas_ganadas: i32,
    pub fecha_evento: DateTime<Utc>,
    pub nombre_coordinador: String,
    pub campus: String,
}

impl CertificateData {
    pub fn new(registration: &Registration, event: &Event) -> Self {
        Self {
            nombre_estudiante: registration.nombre_estudiante.clone(),
            nombre_evento: event.titulo.clone(),
            horas_ganadas: registration.horas_ganadas,
            fecha_evento: event.fecha,
            nombre_coordinador: event
                .creador_nombre
                .clone()
                .unwrap_or_else(|| "Coordinación de Vinculación".to_string()),
            campus: event.campus.clone(),
        }
    }

    /// "Con una duración de N hora(s) de vinculación universitaria"
    pub fn hours_sentence(&self) -> String {
        let plural = if self.horas_ganadas == 1 { "" } else { "s" };
        format!(
            "Con una duración de {} hora{} de vinculación universitaria",
            self.horas_ganadas, plural
        )
    }

    pub fn date_sentence(&self) -> String {
        format!("Realizado el {} en {}", format_date_es(self.fecha_evento), self.campus)
    }

    /// `Certificado_<Name_With_Underscores>.pdf`
    pub fn file_name(&self) -> String {
        let name = self.nombre_estudiante.split_whitespace().collect::<Vec<_>>().join("_");
        sanitize_filename(&format!("Certificado_{}.pdf", name))
    }
}

/// A rendered certificate
#[derive(Debug, Clone)]
pub struct Certificate {
    pub inscripcion_id: Uuid,
    pub file_name: String,
    pub codigo: String,
    pub bytes: Vec<u8>,
}

pub fn certificate_code() -> String {
    format!("CERT-{}", generate_random_digits(8))
}

#[derive(Clone)]
pub struct CertificateService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
    config: CertificateConfig,
}

impl CertificateService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        events: Arc<dyn EventRepository>,
        config: CertificateConfig,
    ) -> Self {
        Self {
            registrations,
            events,
            config,
        }
    }

    async fn get_event(&self, evento_id: Uuid) -> Result<Event> {
        self.events
            .find_by_id(evento_id)
            .await?
            .ok_or(VincuHubError::EventNotFound { evento_id })
    }

    fn ensure_finished(event: &Event) -> Result<()> {
        if event.estado != EventState::Finalizado {
            return Err(VincuHubError::invalid(
                "Los certificados solo están disponibles para eventos finalizados",
            ));
        }
        Ok(())
    }

    fn is_eligible(registration: &Registration) -> bool {
        registration.asistencia && registration.horas_ganadas > 0
    }

    /// Certificate for one registration; the student, the event's creator or an admin
    pub async fn certificate_for(&self, actor: &User, inscripcion_id: Uuid) -> Result<Certificate> {
        let registration = self
            .registrations
            .find_by_id(inscripcion_id)
            .await?
            .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id })?;
        let event = self.get_event(registration.evento_id).await?;

        let allowed = registration.uid == actor.uid || event.creador_uid == actor.uid || actor.rol == Role::Admin;
        if !allowed {
            return Err(VincuHubError::forbidden("No tienes acceso a este certificado"));
        }

        Self::ensure_finished(&event)?;
        if !Self::is_eligible(&registration) {
            return Err(VincuHubError::invalid(
                "El certificado requiere asistencia registrada con horas acreditadas",
            ));
        }

        let certificate = self.render(&registration, &event)?;
        info!(
            inscripcion_id = %inscripcion_id,
            codigo = %certificate.codigo,
            requested_by = %actor.uid,
            "Certificate generated"
        );
        Ok(certificate)
    }

    /// Certificates for every eligible registration of a finished event
    pub async fn certificates_for_event(&self, actor: &User, evento_id: Uuid) -> Result<Vec<Certificate>> {
        let event = self.get_event(evento_id).await?;
        if event.creador_uid != actor.uid && actor.rol != Role::Admin {
            return Err(VincuHubError::forbidden(
                "Solo el creador del evento o un administrador puede generar certificados",
            ));
        }
        Self::ensure_finished(&event)?;

        let certificates = self
            .registrations
            .list_by_event(evento_id)
            .await?
            .iter()
            .filter(|r| Self::is_eligible(r))
            .map(|r| self.render(r, &event))
            .collect::<Result<Vec<_>>>()?;

        info!(evento_id = %evento_id, count = certificates.len(), "Event certificates generated");
        Ok(certificates)
    }

    fn render(&self, registration: &Registration, event: &Event) -> Result<Certificate> {
        let data = CertificateData::new(registration, event);
        let codigo = certificate_code();
        let bytes = render_certificate(&data, &self.config, Utc::now(), &codigo)?;
        debug!(file = %data.file_name(), size = bytes.len(), "Certificate rendered");

        Ok(Certificate {
            inscripcion_id: registration.id,
            file_name: data.file_name(),
            codigo,
            bytes,
        })
    }
}

fn pdf_error(e: printpdf::Error) -> VincuHubError {
    VincuHubError::Certificate(e.to_string())
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Layer wrapper working in millimetres from the top-left corner
struct Canvas {
    layer: PdfLayerReference,
}

impl Canvas {
    fn text_width(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
    }

    fn centered(&self, text: &str, size: f32, top: f32, font: &IndirectFontRef, color: (f32, f32, f32)) {
        let x = ((PAGE_WIDTH - Self::text_width(text, size)) / 2.0).max(15.0);
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - top), font);
    }

    fn line(&self, points: &[(f32, f32)], closed: bool, thickness: f32, color: (f32, f32, f32)) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: points
                .iter()
                .map(|&(x, top)| (Point::new(Mm(x), Mm(PAGE_HEIGHT - top)), false))
                .collect(),
            is_closed: closed,
        });
    }

    fn frame(&self, inset: f32, thickness: f32, color: (f32, f32, f32)) {
        let (left, right) = (inset, PAGE_WIDTH - inset);
        let (top, bottom) = (inset, PAGE_HEIGHT - inset);
        self.line(&[(left, top), (right, top), (right, bottom), (left, bottom)], true, thickness, color);
    }
}

/// Render the certificate PDF
pub fn render_certificate(
    data: &CertificateData,
    config: &CertificateConfig,
    issued: DateTime<Utc>,
    codigo: &str,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Certificado - {}", data.nombre_estudiante),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Certificado",
    );

    let helvetica = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let helvetica_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
    let times_bold = doc.add_builtin_font(BuiltinFont::TimesBold).map_err(pdf_error)?;

    let canvas = Canvas {
        layer: doc.get_page(page).get_layer(layer),
    };

    // double border
    canvas.frame(10.0, 2.0 / PT_TO_MM, BLUE);
    canvas.frame(12.0, 0.5 / PT_TO_MM, BLUE);

    canvas.centered(&config.institution, 24.0, 30.0, &helvetica_bold, BLUE);
    canvas.centered(&config.institution_subtitle, 12.0, 38.0, &helvetica, GREY);

    canvas.centered("CERTIFICADO DE PARTICIPACIÓN", 28.0, 60.0, &times_bold, BLUE);
    canvas.line(&[(60.0, 65.0), (PAGE_WIDTH - 60.0, 65.0)], false, 0.5 / PT_TO_MM, BLUE);

    canvas.centered("Se otorga el presente certificado a:", 14.0, 80.0, &helvetica, DARK_GREY);

    let student = data.nombre_estudiante.to_uppercase();
    canvas.centered(&student, 22.0, 95.0, &times_bold, BLACK);
    let half = Canvas::text_width(&student, 22.0) / 2.0 + 10.0;
    canvas.line(
        &[(PAGE_WIDTH / 2.0 - half, 98.0), (PAGE_WIDTH / 2.0 + half, 98.0)],
        false,
        0.3 / PT_TO_MM,
        BLACK,
    );

    canvas.centered("Por su participación en el evento:", 13.0, 110.0, &helvetica, DARK_GREY);

    let title_lines = wrap_text(&data.nombre_evento, TITLE_WRAP_CHARS);
    for (i, line) in title_lines.iter().enumerate() {
        canvas.centered(line, 16.0, 120.0 + i as f32 * 6.0, &helvetica_bold, BLUE);
    }

    let hours_top = 120.0 + title_lines.len() as f32 * 6.0;
    canvas.centered(&data.hours_sentence(), 13.0, hours_top + 10.0, &helvetica, DARK_GREY);
    canvas.centered(&data.date_sentence(), 13.0, hours_top + 20.0, &helvetica, DARK_GREY);

    let signature_top = PAGE_HEIGHT - 50.0;
    canvas.line(
        &[(PAGE_WIDTH / 2.0 - 40.0, signature_top), (PAGE_WIDTH / 2.0 + 40.0, signature_top)],
        false,
        0.3 / PT_TO_MM,
        BLACK,
    );
    canvas.centered(&data.nombre_coordinador, 11.0, signature_top + 6.0, &helvetica_bold, BLACK);
    canvas.centered(&config.signer_title, 10.0, signature_top + 12.0, &helvetica, BLACK);

    canvas.centered(
        &format!("Emitido: {}", format_date_es(issued)),
        9.0,
        PAGE_HEIGHT - 15.0,
        &helvetica,
        LIGHT_GREY,
    );
    canvas.centered(&format!("Código: {}", codigo), 9.0, PAGE_HEIGHT - 10.0, &helvetica, LIGHT_GREY);

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn data(horas: i32) -> CertificateData {
        CertificateData {
            nombre_estudiante: "Ana María  López".to_string(),
            nombre_evento: "Feria de Emprendimiento y Tecnología Aplicada para la Comunidad Universitaria".to_string(),
            horas_ganadas: horas,
            fecha_evento: Utc.with_ymd_and_hms(2025, 3, 15, 14, 0, 0).unwrap(),
            nombre_coordinador: "Carlos Pérez".to_string(),
            campus: "San Pedro Sula".to_string(),
        }
    }

    #[test]
    fn test_sentences() {
        assert_eq!(data(1).hours_sentence(), "Con una duración de 1 hora de vinculación universitaria");
        assert_eq!(data(4).hours_sentence(), "Con una duración de 4 horas de vinculación universitaria");
        assert_eq!(data(4).date_sentence(), "Realizado el 15 de marzo de 2025 en San Pedro Sula");
    }

    #[test]
    fn test_file_name_and_code() {
        assert_eq!(data(2).file_name(), "Certificado_Ana_María_López.pdf");

        let code = certificate_code();
        assert!(code.starts_with("CERT-"));
        assert_eq!(code.len(), 13);
        assert!(code[5..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_render_produces_pdf() {
        let config = crate::config::settings::Settings::default().certificates;
        let bytes = render_certificate(&data(3), &config, Utc::now(), "CERT-12345678").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
