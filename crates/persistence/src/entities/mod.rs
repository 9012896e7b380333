//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod audit_log;
pub mod weekly_registration;

pub use audit_log::AuditLogEntity;
pub use weekly_registration::WeeklyRegistrationEntity;
