//! Cryptographic utilities for session signing and secret handling.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a session nonce (rendered as 32 hex chars).
pub const NONCE_BYTES: usize = 16;

/// Computes HMAC-SHA256 of `message` keyed by `key`, as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], message: &str) -> String {
    // HMAC accepts keys of any length, so this never fails in practice.
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(message.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Verifies a hex HMAC-SHA256 signature in constant time.
///
/// Returns `false` for malformed hex as well as for mismatches.
pub fn verify_hmac_sha256_hex(key: &[u8], message: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Compares two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generates a random hex nonce for session identifiers.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Redacts a secret-like input for logging: keeps the first two characters.
///
/// Inputs of two characters or fewer are fully masked.
pub fn redact_secret(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.chars().count() <= 2 {
        return "***".to_string();
    }
    let prefix: String = trimmed.chars().take(2).collect();
    format!("{}***", prefix)
}
