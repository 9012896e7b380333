//! Domain services for club registration.
//!
//! Pure business rules: week bucketing, court/fee computation, submission
//! merging and audit entry construction.

pub mod audit;
pub mod fees;
pub mod merge;
pub mod week;

pub use audit::{audit_helpers, AuditLogBuilder};
pub use fees::{compute_summary, summarize_registration};
pub use merge::{
    plan_submission, remove_player, validate_submission, MergeError, PlayerRemoval,
    SubmissionError, SubmissionPlan,
};
pub use week::{format_range, next_week_range, same_week};
