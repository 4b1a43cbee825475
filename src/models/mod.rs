//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod forum;
pub mod chat;

// Re-export commonly used models
pub use user::{User, Role, RegisterStudentRequest, CreateUserRequest, UpdateUserRequest, UserStats, DeletionCheck};
pub use event::{Event, EventState, EventType, CreateEventRequest, UpdateEventRequest, ChangeStateRequest, CoordinatorStats};
pub use registration::{
    Registration, AttendanceUpdate, AttendanceOutcome, DashboardEvent, RegisteredEvent, StudentStats,
    StudentDashboard, TARGET_HOURS,
};
pub use forum::{Forum, ForumMessage, CreateMessageRequest, SetClosedRequest};
pub use chat::{ChatMessage, ChatRole, FaqEntry, FaqCategory, SendChatRequest, ChatReply};
