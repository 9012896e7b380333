//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod fees;
pub mod health;
pub mod registrations;
pub mod settings;
pub mod week;
