//! Repository implementations for database operations.

pub mod audit_log;
pub mod settings;
pub mod weekly_registration;

pub use audit_log::AuditLogRepository;
pub use settings::SettingsRepository;
pub use weekly_registration::WeeklyRegistrationRepository;
