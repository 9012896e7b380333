//! `ClubStore` backends.

pub mod memory;
pub mod postgres;
pub mod tiered;

pub use memory::MemoryClubStore;
pub use postgres::PgClubStore;
pub use tiered::TieredClubStore;
