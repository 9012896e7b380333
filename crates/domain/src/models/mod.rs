//! Domain models for the club registration service.

pub mod audit_log;
pub mod export;
pub mod registration;
pub mod settings;
pub mod summary;

pub use audit_log::{AuditAction, AuditKind, AuditLogEntry};
pub use export::{ExportDocument, ExportMetadata, ImportError, EXPORT_FORMAT_VERSION};
pub use registration::{Player, WeekRange, WeeklyRegistration};
pub use settings::{FeeSharing, Settings};
pub use summary::RegistrationSummary;
