//! Domain layer for the club registration service.
//!
//! This crate contains:
//! - Domain models (Settings, WeeklyRegistration, AuditLogEntry, export format)
//! - Business rules (week bucketing, fees, merging, audit entries)
//! - The `ClubStore` persistence facade

pub mod models;
pub mod services;
pub mod store;
