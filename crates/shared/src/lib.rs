//! Shared utilities and common types for the club registration backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (HMAC signing, hashing, redaction)
//! - Admin passcode hashing with Argon2id
//! - Player name validation and normalization

pub mod crypto;
pub mod password;
pub mod validation;
