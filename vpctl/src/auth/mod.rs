//! Authentication: password hashing and the session authority.
//!
//! Passwords are stored as argon2id PHC strings ([`password`]). Sessions are
//! signed JWTs held in a cookie, backed by an in-memory liveness table so that
//! logout takes effect immediately ([`session`]).

pub mod password;
pub mod session;
