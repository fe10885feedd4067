//! The session authority: signed, time-limited session tokens.
//!
//! A session is a JWT (HS256) carried in a cookie, paired with an in-memory
//! liveness entry keyed by the token's `jti`. The JWT makes the token signed
//! and self-describing (identity, role, expiry); the liveness table makes
//! logout immediate and carries the one-shot prediction outcome for the next
//! dashboard render. Nothing here is persisted to durable storage: a restart
//! logs everyone out.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::models::users::Role,
    config::Config,
    db::models::users::UserDBResponse,
    errors::Error,
    types::{SessionId, UserId},
};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub jti: SessionId,   // Session id, key into the liveness table
    pub sub: UserId,      // User id
    pub username: String, // Username
    pub role: Role,       // Role at login time
    pub exp: i64,         // Expiration time
    pub iat: i64,         // Issued at
}

/// A validated session, as seen by handlers.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.jti,
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            issued_at: DateTime::from_timestamp(claims.iat, 0).unwrap_or_else(Utc::now),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// Server-side state for one live session.
#[derive(Debug)]
struct LiveSession {
    expires_at: DateTime<Utc>,
    pending_outcome: Option<String>,
}

/// In-memory session table. Shared across requests via `Arc`; expiry is
/// checked lazily on access, so no background sweep is needed.
#[derive(Debug, Default)]
pub struct Sessions {
    live: DashMap<SessionId, LiveSession>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a signed session token for a freshly authenticated user.
    pub fn issue(&self, user: &UserDBResponse, config: &Config) -> Result<(String, Session), Error> {
        let now = Utc::now();
        let expires_at = now + config.session.timeout;

        let claims = SessionClaims {
            jti: Uuid::new_v4(),
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
        let token = encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
            operation: format!("sign session token: {e}"),
        })?;

        self.live.insert(
            claims.jti,
            LiveSession {
                expires_at,
                pending_outcome: None,
            },
        );

        Ok((token, Session::from(claims)))
    }

    /// Verify a session token and check it against the liveness table.
    ///
    /// Fails `Unauthenticated` for malformed/expired/logged-out tokens and
    /// `Forbidden` when `required_role` is set and does not match.
    pub fn validate(&self, token: &str, required_role: Option<Role>, config: &Config) -> Result<Session, Error> {
        let claims = decode_claims(token, config, &Validation::default())?;

        match self.live.get(&claims.jti) {
            None => return Err(Error::Unauthenticated { message: None }),
            Some(entry) => {
                // Absolute timeout, enforced lazily on each access
                if Utc::now() > entry.expires_at {
                    drop(entry);
                    self.live.remove(&claims.jti);
                    return Err(Error::Unauthenticated { message: None });
                }
            }
        }

        if let Some(required) = required_role
            && claims.role != required
        {
            return Err(Error::Forbidden { message: None });
        }

        Ok(Session::from(claims))
    }

    /// Terminate a session immediately (logout). Returns the session identity
    /// when a live entry was actually removed, so the caller can audit it.
    pub fn invalidate(&self, token: &str, config: &Config) -> Option<Session> {
        // Accept expired-but-well-signed tokens here: logging out of a stale
        // session must still clear its liveness entry.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode_claims(token, config, &validation).ok()?;
        self.live.remove(&claims.jti).map(|_| Session::from(claims))
    }

    /// Stash a prediction outcome for one-time display on the next dashboard
    /// render.
    pub fn stash_outcome(&self, session_id: SessionId, outcome: String) {
        if let Some(mut entry) = self.live.get_mut(&session_id) {
            entry.pending_outcome = Some(outcome);
        }
    }

    /// Consume the stashed outcome, if any. Subsequent calls return `None`.
    pub fn take_outcome(&self, session_id: SessionId) -> Option<String> {
        self.live.get_mut(&session_id).and_then(|mut entry| entry.pending_outcome.take())
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign sessions: secret_key is required".to_string(),
    })
}

fn decode_claims(token: &str, config: &Config, validation: &Validation) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());

    let token_data = decode::<SessionClaims>(token, &key, validation).map_err(|e| match e.kind() {
        // Key/config problems are server errors; everything else is a client
        // presenting a token we do not accept
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("verify session token: {e}"),
        },
        _ => Error::Unauthenticated { message: None },
    })?;

    Ok(token_data.claims)
}

/// Extract the raw session token from the request's `Cookie` header.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_str = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=')
            && name == cookie_name
        {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, test_user_row};

    #[test]
    fn test_issue_and_validate_round_trip() {
        let config = create_test_config();
        let sessions = Sessions::new();
        let user = test_user_row(7, "tester", Role::User);

        let (token, issued) = sessions.issue(&user, &config).unwrap();
        let session = sessions.validate(&token, Some(Role::User), &config).unwrap();

        assert_eq!(session.id, issued.id);
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "tester");
        assert_eq!(session.role, Role::User);
    }

    #[test]
    fn test_role_mismatch_is_forbidden() {
        let config = create_test_config();
        let sessions = Sessions::new();
        let user = test_user_row(1, "root", Role::Admin);

        let (token, _) = sessions.issue(&user, &config).unwrap();

        let result = sessions.validate(&token, Some(Role::User), &config);
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        // Without a role requirement the same token is fine
        assert!(sessions.validate(&token, None, &config).is_ok());
    }

    #[test]
    fn test_invalidate_kills_the_session() {
        let config = create_test_config();
        let sessions = Sessions::new();
        let user = test_user_row(2, "tester", Role::User);

        let (token, _) = sessions.issue(&user, &config).unwrap();
        assert!(sessions.validate(&token, None, &config).is_ok());

        let removed = sessions.invalidate(&token, &config).unwrap();
        assert_eq!(removed.username, "tester");

        let result = sessions.validate(&token, None, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));

        // Second invalidate finds nothing
        assert!(sessions.invalidate(&token, &config).is_none());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let mut config = create_test_config();
        config.session.timeout = std::time::Duration::ZERO;
        let sessions = Sessions::new();
        let user = test_user_row(3, "tester", Role::User);

        // The JWT itself is within verification leeway, but the liveness
        // entry's deadline has passed
        let (token, _) = sessions.issue(&user, &config).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));

        let result = sessions.validate(&token, None, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let config = create_test_config();
        let sessions = Sessions::new();
        let user = test_user_row(4, "tester", Role::User);

        let (token, _) = sessions.issue(&user, &config).unwrap();

        let mut other_config = create_test_config();
        other_config.secret_key = Some("a-different-secret".to_string());
        let result = sessions.validate(&token, None, &other_config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));

        for garbage in ["", "not.a.token", "too.many.parts.in.this.token"] {
            let result = sessions.validate(garbage, None, &config);
            assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }), "token: {garbage}");
        }
    }

    #[test]
    fn test_outcome_is_one_shot() {
        let config = create_test_config();
        let sessions = Sessions::new();
        let user = test_user_row(5, "tester", Role::User);

        let (_, session) = sessions.issue(&user, &config).unwrap();

        assert_eq!(sessions.take_outcome(session.id), None);

        sessions.stash_outcome(session.id, "Success".to_string());
        assert_eq!(sessions.take_outcome(session.id), Some("Success".to_string()));
        assert_eq!(sessions.take_outcome(session.id), None);
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "other=1; vpctl_session=abc.def.ghi; trailing=2".parse().unwrap(),
        );

        assert_eq!(token_from_headers(&headers, "vpctl_session"), Some("abc.def.ghi".to_string()));
        assert_eq!(token_from_headers(&headers, "missing"), None);
        assert_eq!(token_from_headers(&HeaderMap::new(), "vpctl_session"), None);
    }
}
