//! HTTP handlers, one module per resource

pub mod auth;
pub mod certificates;
pub mod chat;
pub mod events;
pub mod forums;
pub mod health;
pub mod pages;
pub mod registrations;
pub mod users;
