//! Fixture builders for users, events and attendance payloads

use chrono::{Duration, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use uuid::Uuid;

use vincuhub::models::event::{CreateEventRequest, EventType};
use vincuhub::models::registration::AttendanceUpdate;
use vincuhub::models::user::{RegisterStudentRequest, Role, User};

pub const TEST_PASSWORD: &str = "secreto123";
pub const TEST_CAMPUS: &str = "Ceutec";

/// Unique, valid institutional address
pub fn unique_email(prefix: &str) -> String {
    format!("{}.{}@ceutec.hn", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Account with a random name; not persisted
pub fn fake_user(rol: Role) -> User {
    let nombre: String = FirstName().fake();
    let apellido: String = LastName().fake();

    let mut user = User::new(nombre, unique_email(rol.as_str()), rol);
    user.apellido = Some(apellido);
    user.campus = Some(TEST_CAMPUS.to_string());
    if rol == Role::Estudiante {
        user.carrera = Some("Ingeniería en Sistemas".to_string());
    }
    user
}

pub fn register_request(correo: &str) -> RegisterStudentRequest {
    RegisterStudentRequest {
        nombre: FirstName().fake(),
        apellido: Some(LastName().fake()),
        correo: correo.to_string(),
        password: TEST_PASSWORD.to_string(),
        carrera: Some("Ingeniería en Sistemas".to_string()),
        campus: None,
        universidad: Some("CEUTEC".to_string()),
    }
}

/// Event request dated `days_ahead` days from now (negative for past events)
pub fn event_request(cupo: i32, days_ahead: i64) -> CreateEventRequest {
    CreateEventRequest {
        titulo: format!("Jornada de reforestación {}", &Uuid::new_v4().simple().to_string()[..4]),
        descripcion: "Siembra de árboles en el parque central".to_string(),
        fecha: Utc::now() + Duration::days(days_ahead),
        hora_inicio: "08:00".to_string(),
        hora_fin: "12:00".to_string(),
        ubicacion: "Parque Central".to_string(),
        campus: TEST_CAMPUS.to_string(),
        facultad: "Ingeniería".to_string(),
        cupo,
        tipo: EventType::Voluntariado,
    }
}

pub fn attendance(inscripcion_id: Uuid, asistencia: bool, horas: i32) -> AttendanceUpdate {
    AttendanceUpdate {
        inscripcion_id,
        asistencia,
        horas_ganadas: horas,
        comentarios: None,
    }
}
