//! Persistence layer for the club registration service.
//!
//! - PostgreSQL pool management and migrations
//! - Row mappings and repositories
//! - [`store`] implementations of `domain::store::ClubStore`: PostgreSQL,
//!   in-memory, and a tiered store that serves reads from a fallback copy

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;
