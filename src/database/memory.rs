//! In-memory store
//!
//! Implements every repository trait over a single lock, so each operation
//! observes and mutates a consistent snapshot. Used by tests and by local
//! runs without PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repositories::{EventRepository, ForumRepository, RegistrationRepository, UserRepository};
use crate::models::*;
use crate::models::forum::DELETED_MESSAGE_TEXT;
use crate::models::registration::apply_credit_delta;
use crate::utils::errors::{Result, VincuHubError};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    registrations: HashMap<Uuid, Registration>,
    forums: HashMap<Uuid, Forum>,
    messages: HashMap<Uuid, ForumMessage>,
}

impl MemoryState {
    fn admin_count(&self) -> usize {
        self.users.values().filter(|u| u.rol == Role::Admin).count()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(users: &mut [User]) {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User> {
        let mut state = self.state.write().await;
        let correo = user.correo.trim().to_lowercase();
        let google_taken = user.google_sub.is_some()
            && state.users.values().any(|u| u.google_sub == user.google_sub);
        if google_taken || state.users.values().any(|u| u.correo == correo) {
            return Err(VincuHubError::EmailTaken);
        }
        let mut stored = user.clone();
        stored.correo = correo;
        state.users.insert(stored.uid, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, uid: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&uid).cloned())
    }

    async fn find_by_email(&self, correo: &str) -> Result<Option<User>> {
        let correo = correo.trim().to_lowercase();
        Ok(self.state.read().await.users.values().find(|u| u.correo == correo).cloned())
    }

    async fn find_by_google_sub(&self, google_sub: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.google_sub.as_deref() == Some(google_sub))
            .cloned())
    }

    async fn link_google(&self, uid: Uuid, google_sub: &str) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&uid).ok_or(VincuHubError::UserNotFound { uid })?;
        user.google_sub = Some(google_sub.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.state.read().await.users.values().cloned().collect();
        newest_first(&mut users);
        Ok(users)
    }

    async fn list_by_role(&self, rol: Role) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .state
            .read()
            .await
            .users
            .values()
            .filter(|u| u.rol == rol)
            .cloned()
            .collect();
        newest_first(&mut users);
        Ok(users)
    }

    async fn update(&self, uid: Uuid, changes: &UpdateUserRequest) -> Result<User> {
        let mut state = self.state.write().await;
        let admin_count = state.admin_count();
        let user = state.users.get_mut(&uid).ok_or(VincuHubError::UserNotFound { uid })?;
        let demotes_admin = user.rol == Role::Admin && changes.rol.is_some_and(|rol| rol != Role::Admin);
        if demotes_admin && admin_count <= 1 {
            return Err(VincuHubError::LastAdmin);
        }
        if let Some(ref nombre) = changes.nombre {
            user.nombre = nombre.clone();
        }
        if changes.apellido.is_some() {
            user.apellido = changes.apellido.clone();
        }
        if changes.carrera.is_some() {
            user.carrera = changes.carrera.clone();
        }
        if changes.campus.is_some() {
            user.campus = changes.campus.clone();
        }
        if changes.universidad.is_some() {
            user.universidad = changes.universidad.clone();
        }
        if changes.foto_url.is_some() {
            user.foto_url = changes.foto_url.clone();
        }
        if let Some(rol) = changes.rol {
            user.rol = rol;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, uid: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get(&uid) else {
            return Ok(false);
        };
        if user.rol == Role::Admin && state.admin_count() <= 1 {
            return Err(VincuHubError::LastAdmin);
        }
        if state.events.values().any(|e| e.creador_uid == uid) {
            return Err(VincuHubError::UserHasEvents);
        }
        state.users.remove(&uid);
        state.registrations.retain(|_, r| r.uid != uid);
        Ok(true)
    }

    async fn count_by_role(&self, rol: Role) -> Result<i64> {
        Ok(self.state.read().await.users.values().filter(|u| u.rol == rol).count() as i64)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create_with_forum(&self, event: &Event, forum: &Forum) -> Result<Event> {
        let mut state = self.state.write().await;
        let mut stored = event.clone();
        stored.foro_id = Some(forum.id);
        state.forums.insert(forum.id, Forum { evento_id: stored.id, ..forum.clone() });
        state.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn list_by_state(&self, estado: EventState, campus: Option<&str>) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state
            .read()
            .await
            .events
            .values()
            .filter(|e| e.estado == estado && campus.map_or(true, |c| e.campus == c))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.fecha.cmp(&b.fecha));
        Ok(events)
    }

    async fn list_by_creator(&self, uid: Uuid) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state
            .read()
            .await
            .events
            .values()
            .filter(|e| e.creador_uid == uid)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.fecha.cmp(&a.fecha));
        Ok(events)
    }

    async fn update(&self, id: Uuid, changes: &UpdateEventRequest) -> Result<Event> {
        let mut state = self.state.write().await;
        let event = state.events.get_mut(&id).ok_or(VincuHubError::EventNotFound { evento_id: id })?;
        if let Some(ref titulo) = changes.titulo {
            event.titulo = titulo.clone();
        }
        if let Some(ref descripcion) = changes.descripcion {
            event.descripcion = descripcion.clone();
        }
        if let Some(fecha) = changes.fecha {
            event.fecha = fecha;
        }
        if let Some(ref hora_inicio) = changes.hora_inicio {
            event.hora_inicio = hora_inicio.clone();
        }
        if let Some(ref hora_fin) = changes.hora_fin {
            event.hora_fin = hora_fin.clone();
        }
        if let Some(ref ubicacion) = changes.ubicacion {
            event.ubicacion = ubicacion.clone();
        }
        if let Some(ref campus) = changes.campus {
            event.campus = campus.clone();
        }
        if let Some(ref facultad) = changes.facultad {
            event.facultad = facultad.clone();
        }
        if let Some(cupo) = changes.cupo {
            event.cupo = cupo;
        }
        if let Some(tipo) = changes.tipo {
            event.tipo = tipo;
        }
        if changes.imagen_url.is_some() {
            event.imagen_url = changes.imagen_url.clone();
        }
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn set_state(&self, id: Uuid, estado: EventState) -> Result<Event> {
        let mut state = self.state.write().await;
        let event = state.events.get_mut(&id).ok_or(VincuHubError::EventNotFound { evento_id: id })?;
        event.estado = estado;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }
}

#[async_trait]
impl RegistrationRepository for MemoryStore {
    async fn register(&self, registration: &Registration) -> Result<Registration> {
        let mut state = self.state.write().await;
        let duplicate = state
            .registrations
            .values()
            .any(|r| r.uid == registration.uid && r.evento_id == registration.evento_id);

        let event = state
            .events
            .get_mut(&registration.evento_id)
            .ok_or(VincuHubError::EventNotFound { evento_id: registration.evento_id })?;
        if event.is_full() {
            return Err(VincuHubError::EventFull);
        }
        if duplicate {
            return Err(VincuHubError::AlreadyRegistered);
        }
        event.inscritos_count += 1;
        event.updated_at = Utc::now();

        state.registrations.insert(registration.id, registration.clone());
        Ok(registration.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        Ok(self.state.read().await.registrations.get(&id).cloned())
    }

    async fn find_by_student_and_event(&self, uid: Uuid, evento_id: Uuid) -> Result<Option<Registration>> {
        Ok(self
            .state
            .read()
            .await
            .registrations
            .values()
            .find(|r| r.uid == uid && r.evento_id == evento_id)
            .cloned())
    }

    async fn list_by_event(&self, evento_id: Uuid) -> Result<Vec<Registration>> {
        let mut registrations: Vec<Registration> = self
            .state
            .read()
            .await
            .registrations
            .values()
            .filter(|r| r.evento_id == evento_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| a.fecha_inscripcion.cmp(&b.fecha_inscripcion));
        Ok(registrations)
    }

    async fn list_by_student(&self, uid: Uuid) -> Result<Vec<Registration>> {
        let mut registrations: Vec<Registration> = self
            .state
            .read()
            .await
            .registrations
            .values()
            .filter(|r| r.uid == uid)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| b.fecha_inscripcion.cmp(&a.fecha_inscripcion));
        Ok(registrations)
    }

    async fn cancel(&self, id: Uuid) -> Result<Registration> {
        let mut state = self.state.write().await;
        let current = state
            .registrations
            .get(&id)
            .cloned()
            .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id: id })?;
        if current.asistencia {
            return Err(VincuHubError::AttendanceAlreadyRecorded);
        }
        state.registrations.remove(&id);
        if let Some(event) = state.events.get_mut(&current.evento_id) {
            event.inscritos_count = (event.inscritos_count - 1).max(0);
            event.updated_at = Utc::now();
        }
        Ok(current)
    }

    async fn record_attendance(&self, update: &AttendanceUpdate, registrado_por: Uuid) -> Result<AttendanceOutcome> {
        let mut state = self.state.write().await;
        let current = state
            .registrations
            .get(&update.inscripcion_id)
            .cloned()
            .ok_or(VincuHubError::RegistrationNotFound { inscripcion_id: update.inscripcion_id })?;
        if !state.users.contains_key(&current.uid) {
            return Err(VincuHubError::UserNotFound { uid: current.uid });
        }

        let mut updated = current.clone();
        updated.asistencia = update.asistencia;
        updated.horas_ganadas = if update.asistencia { update.horas_ganadas } else { 0 };
        updated.registrado_por = Some(registrado_por);
        updated.fecha_registro_asistencia = Some(Utc::now());
        updated.comentarios = update.comentarios.clone();

        let previous_credit = current.credit();
        let new_credit = updated.credit();

        let student_total = match state.users.get_mut(&current.uid) {
            Some(student) => {
                student.horas_vinculacion_total =
                    apply_credit_delta(student.horas_vinculacion_total, previous_credit, new_credit);
                student.updated_at = Utc::now();
                student.horas_vinculacion_total
            }
            None => return Err(VincuHubError::UserNotFound { uid: current.uid }),
        };
        state.registrations.insert(updated.id, updated.clone());

        Ok(AttendanceOutcome {
            registration: updated,
            previous_credit,
            new_credit,
            student_total,
        })
    }

    async fn certified_hours_for_creator(&self, creador_uid: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .registrations
            .values()
            .filter(|r| r.asistencia)
            .filter(|r| state.events.get(&r.evento_id).is_some_and(|e| e.creador_uid == creador_uid))
            .map(|r| r.horas_ganadas as i64)
            .sum())
    }
}

#[async_trait]
impl ForumRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Forum>> {
        Ok(self.state.read().await.forums.get(&id).cloned())
    }

    async fn find_by_event(&self, evento_id: Uuid) -> Result<Option<Forum>> {
        Ok(self
            .state
            .read()
            .await
            .forums
            .values()
            .find(|f| f.evento_id == evento_id)
            .cloned())
    }

    async fn set_closed(&self, id: Uuid, cerrado: bool) -> Result<Forum> {
        let mut state = self.state.write().await;
        let forum = state.forums.get_mut(&id).ok_or(VincuHubError::ForumNotFound)?;
        forum.cerrado = cerrado;
        Ok(forum.clone())
    }

    async fn add_message(&self, message: &ForumMessage) -> Result<ForumMessage> {
        let mut state = self.state.write().await;
        let forum = state.forums.get_mut(&message.foro_id).ok_or(VincuHubError::ForumNotFound)?;
        forum.mensajes_count += 1;
        state.messages.insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn list_messages(&self, foro_id: Uuid) -> Result<Vec<ForumMessage>> {
        let mut messages: Vec<ForumMessage> = self
            .state
            .read()
            .await
            .messages
            .values()
            .filter(|m| m.foro_id == foro_id && !m.eliminado)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.fecha.cmp(&b.fecha));
        Ok(messages)
    }

    async fn soft_delete_message(&self, foro_id: Uuid, mensaje_id: Uuid) -> Result<ForumMessage> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .get_mut(&mensaje_id)
            .filter(|m| m.foro_id == foro_id)
            .ok_or(VincuHubError::MessageNotFound { mensaje_id })?;
        message.eliminado = true;
        message.contenido = DELETED_MESSAGE_TEXT.to_string();
        Ok(message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_with_capacity(cupo: i32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            titulo: "Taller".to_string(),
            descripcion: String::new(),
            fecha: now + Duration::days(1),
            hora_inicio: "09:00".to_string(),
            hora_fin: "11:00".to_string(),
            ubicacion: "Aula 3".to_string(),
            campus: "Tegucigalpa".to_string(),
            facultad: "Ingeniería".to_string(),
            cupo,
            tipo: EventType::Taller,
            creador_uid: Uuid::new_v4(),
            creador_nombre: None,
            imagen_url: None,
            estado: EventState::Publicado,
            inscritos_count: 0,
            foro_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn with_forum(store: &MemoryStore, event: Event) -> Event {
        let forum = Forum::for_event(event.id, &event.titulo, event.creador_uid);
        store.create_with_forum(&event, &forum).await.unwrap()
    }

    fn registration_for(uid: Uuid, evento_id: Uuid) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            uid,
            evento_id,
            nombre_estudiante: "Ana".to_string(),
            correo_estudiante: "ana@ceutec.edu".to_string(),
            carrera: None,
            fecha_inscripcion: Utc::now(),
            asistencia: false,
            horas_ganadas: 0,
            registrado_por: None,
            fecha_registro_asistencia: None,
            comentarios: None,
        }
    }

    #[tokio::test]
    async fn test_capacity_guard_leaves_counter_untouched() {
        let store = MemoryStore::new();
        let event = with_forum(&store, event_with_capacity(1)).await;

        store.register(&registration_for(Uuid::new_v4(), event.id)).await.unwrap();
        let second = store.register(&registration_for(Uuid::new_v4(), event.id)).await;
        assert!(matches!(second, Err(VincuHubError::EventFull)));

        let stored = EventRepository::find_by_id(&store, event.id).await.unwrap().unwrap();
        assert_eq!(stored.inscritos_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let store = MemoryStore::new();
        let event = with_forum(&store, event_with_capacity(0)).await;
        let uid = Uuid::new_v4();

        store.register(&registration_for(uid, event.id)).await.unwrap();
        let again = store.register(&registration_for(uid, event.id)).await;
        assert!(matches!(again, Err(VincuHubError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        let user = User::new("Ana".into(), "ana@ceutec.edu".into(), Role::Estudiante);
        UserRepository::create(&store, &user).await.unwrap();

        let mut clash = User::new("Ana".into(), "ana@ceutec.edu".into(), Role::Estudiante);
        clash.correo = "ANA@ceutec.edu".to_string();
        let result = UserRepository::create(&store, &clash).await;
        assert!(matches!(result, Err(VincuHubError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_event_and_forum_are_stored_together() {
        let store = MemoryStore::new();
        let event = with_forum(&store, event_with_capacity(5)).await;

        let forum = store.find_by_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.foro_id, Some(forum.id));
        assert_eq!(forum.evento_id, event.id);
    }

    #[tokio::test]
    async fn test_delete_refuses_last_admin_and_event_creators() {
        let store = MemoryStore::new();
        let admin = UserRepository::create(&store, &User::new("Root".into(), "root@ceutec.edu".into(), Role::Admin))
            .await
            .unwrap();
        let coordinator =
            UserRepository::create(&store, &User::new("Luis".into(), "luis@ceutec.edu".into(), Role::Coordinador))
                .await
                .unwrap();
        let mut event = event_with_capacity(0);
        event.creador_uid = coordinator.uid;
        with_forum(&store, event).await;

        assert!(matches!(store.delete(admin.uid).await, Err(VincuHubError::LastAdmin)));
        assert!(matches!(store.delete(coordinator.uid).await, Err(VincuHubError::UserHasEvents)));
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());

        let demote = UpdateUserRequest { rol: Some(Role::Coordinador), ..Default::default() };
        assert!(matches!(UserRepository::update(&store, admin.uid, &demote).await, Err(VincuHubError::LastAdmin)));
        assert_eq!(store.count_by_role(Role::Admin).await.unwrap(), 1);
    }
}
