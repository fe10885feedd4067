//! Common type definitions.
//!
//! - [`UserId`]: row identifier for user accounts (SQLite rowid)
//! - [`SessionId`]: in-memory session identifier, doubles as the JWT `jti`

use uuid::Uuid;

pub type UserId = i64;
pub type SessionId = Uuid;

/// Abbreviate a session id to its first 8 characters for readable logs.
pub fn abbrev_session(id: &SessionId) -> String {
    id.to_string().chars().take(8).collect()
}
