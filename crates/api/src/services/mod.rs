//! Application services shared by route handlers.

pub mod audit;
pub mod cookies;
pub mod registration;
pub mod session;

pub use audit::AuditLogger;
pub use cookies::CookieHelper;
pub use registration::{RegistrationError, RegistrationService, SubmissionOutcome};
pub use session::{AdminSession, SessionError, SessionService};
