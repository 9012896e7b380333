//! Admin session tokens.
//!
//! Token format: `{issued_at_ms}.{nonce}.{signature}` where the signature is
//! hex HMAC-SHA256 over `{issued_at_ms}.{nonce}` keyed with a server-side
//! secret. The nonce doubles as the session id in audit entries and is what
//! logout revokes.

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::store::{ClubStore, StoreError};
use serde::Serialize;
use shared::crypto::{constant_time_eq, generate_nonce, hmac_sha256_hex, verify_hmac_sha256_hex};
use shared::password::verify_passcode;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Session token is malformed")]
    Malformed,

    #[error("Session has expired")]
    Expired,

    #[error("Session token signature is invalid")]
    BadSignature,

    #[error("Session has been revoked")]
    Revoked,

    #[error("Invalid admin code")]
    InvalidCredential,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Short reason recorded in security audit entries.
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::Malformed => "malformed",
            SessionError::Expired => "expired",
            SessionError::BadSignature => "bad_signature",
            SessionError::Revoked => "revoked",
            SessionError::InvalidCredential => "invalid_credential",
            SessionError::Store(_) => "store_error",
        }
    }
}

/// A verified admin session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: AdminSession,
}

/// Which source vouched for the admin code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    StoredHash,
    LegacyPlaintext,
    ConfigPasscode,
}

pub struct SessionService {
    secret: Vec<u8>,
    ttl: Duration,
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(ttl_secs),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, now: DateTime<Utc>) -> IssuedSession {
        let issued_ms = now.timestamp_millis();
        let nonce = generate_nonce();
        let payload = format!("{}.{}", issued_ms, nonce);
        let signature = hmac_sha256_hex(&self.secret, &payload);
        let issued_at = Utc
            .timestamp_millis_opt(issued_ms)
            .single()
            .unwrap_or(now);

        IssuedSession {
            token: format!("{}.{}", payload, signature),
            session: AdminSession {
                session_id: nonce,
                issued_at,
                expires_at: issued_at + self.ttl,
            },
        }
    }

    /// Checks shape, age, signature and revocation, in that order.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AdminSession, SessionError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [issued_part, nonce, signature] = parts.as_slice() else {
            return Err(SessionError::Malformed);
        };
        if nonce.is_empty() || signature.is_empty() {
            return Err(SessionError::Malformed);
        }

        let issued_ms: i64 = issued_part.parse().map_err(|_| SessionError::Malformed)?;
        let issued_at = Utc
            .timestamp_millis_opt(issued_ms)
            .single()
            .ok_or(SessionError::Malformed)?;

        let age = now.signed_duration_since(issued_at);
        if age < Duration::zero() || age >= self.ttl {
            return Err(SessionError::Expired);
        }

        let payload = format!("{}.{}", issued_part, nonce);
        if !verify_hmac_sha256_hex(&self.secret, &payload, signature) {
            return Err(SessionError::BadSignature);
        }

        if self.is_revoked(nonce) {
            return Err(SessionError::Revoked);
        }

        Ok(AdminSession {
            session_id: nonce.to_string(),
            issued_at,
            expires_at: issued_at + self.ttl,
        })
    }

    /// Revokes the session if the token verifies. Returns the revoked session.
    pub fn revoke(&self, token: &str, now: DateTime<Utc>) -> Option<AdminSession> {
        let session = self.validate(token, now).ok()?;
        let mut revoked = match self.revoked.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(session.session_id.clone(), session.expires_at);
        Some(session)
    }

    fn is_revoked(&self, nonce: &str) -> bool {
        match self.revoked.read() {
            Ok(revoked) => revoked.contains_key(nonce),
            Err(poisoned) => poisoned.into_inner().contains_key(nonce),
        }
    }

    /// Verifies an admin code and issues a session.
    ///
    /// The secret is resolved from, in order: the stored Argon2id hash, a
    /// legacy stored plaintext value, the configured bootstrap passcode.
    /// While storage is unreachable the configured passcode is used alone.
    pub async fn authenticate(
        &self,
        store: &dyn ClubStore,
        config_passcode: Option<&str>,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(IssuedSession, CredentialSource), SessionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SessionError::InvalidCredential);
        }
        let config_passcode = config_passcode.map(str::trim).filter(|p| !p.is_empty());

        let stored = match stored_secret(store).await {
            Ok(stored) => stored,
            Err(e) if e.is_transient() && config_passcode.is_some() => {
                warn!(error = %e, "Admin secret unavailable from storage; using configured passcode");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let source = match stored {
            Some(StoredSecret::Hash(hash)) => match verify_passcode(code, &hash) {
                Ok(true) => Some(CredentialSource::StoredHash),
                Ok(false) => None,
                Err(e) => {
                    error!(error = %e, "Stored admin passcode hash could not be verified");
                    None
                }
            },
            Some(StoredSecret::Plaintext(plaintext)) => {
                warn!("Admin passcode is stored in plaintext; set a new passcode to migrate it");
                constant_time_eq(code.as_bytes(), plaintext.trim().as_bytes())
                    .then_some(CredentialSource::LegacyPlaintext)
            }
            None => match config_passcode {
                Some(passcode) => constant_time_eq(code.as_bytes(), passcode.as_bytes())
                    .then_some(CredentialSource::ConfigPasscode),
                None => {
                    error!("No admin passcode is configured; admin login is disabled");
                    None
                }
            },
        };

        match source {
            Some(source) => Ok((self.issue(now), source)),
            None => Err(SessionError::InvalidCredential),
        }
    }
}

enum StoredSecret {
    Hash(String),
    Plaintext(String),
}

async fn stored_secret(store: &dyn ClubStore) -> Result<Option<StoredSecret>, StoreError> {
    if let Some(hash) = store.admin_secret_hash().await? {
        return Ok(Some(StoredSecret::Hash(hash)));
    }
    Ok(store
        .admin_secret_plaintext()
        .await?
        .map(StoredSecret::Plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::store::MemoryClubStore;
    use shared::password::hash_passcode;

    const SECRET: &[u8] = b"unit-test-signing-secret-0123456789";

    fn service() -> SessionService {
        SessionService::new(SECRET, 86_400)
    }

    #[test]
    fn test_issue_and_validate() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now);

        let parts: Vec<&str> = issued.token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 64);

        let session = service.validate(&issued.token, now).unwrap();
        assert_eq!(session, issued.session);
    }

    #[test]
    fn test_token_valid_after_one_hour() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now);
        assert!(service
            .validate(&issued.token, now + Duration::hours(1))
            .is_ok());
    }

    #[test]
    fn test_token_expired_after_25_hours() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now);
        assert_eq!(
            service.validate(&issued.token, now + Duration::hours(25)),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_token_from_the_future_rejected() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now + Duration::minutes(5));
        assert_eq!(
            service.validate(&issued.token, now),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now);
        let parts: Vec<&str> = issued.token.split('.').collect();

        // Shift the issue time while keeping the old signature.
        let forged_time = format!("{}.{}.{}", parts[0].parse::<i64>().unwrap() + 1, parts[1], parts[2]);
        assert_eq!(
            service.validate(&forged_time, now),
            Err(SessionError::BadSignature)
        );

        let forged_nonce = format!("{}.{}.{}", parts[0], "0".repeat(32), parts[2]);
        assert_eq!(
            service.validate(&forged_nonce, now),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let now = Utc::now();
        let other = SessionService::new(b"another-secret-another-secret-xx".to_vec(), 86_400);
        let issued = other.issue(now);
        assert_eq!(
            service().validate(&issued.token, now),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let service = service();
        let now = Utc::now();
        for token in ["", "abc", "1.2", "a.b.c", "1.2.3.4", "123..sig", "123.nonce."] {
            assert_eq!(
                service.validate(token, now),
                Err(SessionError::Malformed),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_revoke_invalidates_token() {
        let service = service();
        let now = Utc::now();
        let issued = service.issue(now);

        assert!(service.revoke(&issued.token, now).is_some());
        assert_eq!(
            service.validate(&issued.token, now),
            Err(SessionError::Revoked)
        );
        // A second logout is a no-op.
        assert!(service.revoke(&issued.token, now).is_none());

        let other = service.issue(now);
        assert!(service.validate(&other.token, now).is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_with_config_passcode() {
        let store = MemoryClubStore::new();
        let service = service();
        let now = Utc::now();

        let (issued, source) = service
            .authenticate(&store, Some("246810"), "  246810 ", now)
            .await
            .unwrap();
        assert_eq!(source, CredentialSource::ConfigPasscode);
        assert!(service.validate(&issued.token, now).is_ok());

        let err = service
            .authenticate(&store, Some("246810"), "111111", now)
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_stored_hash_takes_precedence() {
        let store = MemoryClubStore::new();
        store
            .set_admin_secret_hash(&hash_passcode("new-code-42").unwrap())
            .await
            .unwrap();
        let service = service();
        let now = Utc::now();

        assert!(service
            .authenticate(&store, Some("246810"), "246810", now)
            .await
            .is_err());
        let (_, source) = service
            .authenticate(&store, Some("246810"), "new-code-42", now)
            .await
            .unwrap();
        assert_eq!(source, CredentialSource::StoredHash);
    }

    #[tokio::test]
    async fn test_legacy_plaintext_still_accepted() {
        let store = MemoryClubStore::new().with_legacy_plaintext("135791");
        let (_, source) = service()
            .authenticate(&store, None, "135791", Utc::now())
            .await
            .unwrap();
        assert_eq!(source, CredentialSource::LegacyPlaintext);
    }

    #[tokio::test]
    async fn test_no_secret_configured_rejects_everything() {
        let store = MemoryClubStore::new();
        let result = service().authenticate(&store, None, "anything", Utc::now()).await;
        assert_eq!(result.unwrap_err(), SessionError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_outage_falls_back_to_configured_passcode() {
        let store = MemoryClubStore::new();
        store.set_available(false);
        let service = service();

        let (_, source) = service
            .authenticate(&store, Some("246810"), "246810", Utc::now())
            .await
            .unwrap();
        assert_eq!(source, CredentialSource::ConfigPasscode);

        let wrong = service
            .authenticate(&store, Some("246810"), "135791", Utc::now())
            .await;
        assert_eq!(wrong.unwrap_err(), SessionError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_outage_without_configured_passcode_surfaces() {
        let store = MemoryClubStore::new();
        store.set_available(false);
        let result = service().authenticate(&store, None, "246810", Utc::now()).await;
        assert!(matches!(result, Err(SessionError::Store(_))));
    }
}
