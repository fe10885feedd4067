//! Persistence layer: SQLite access through repository structs.
//!
//! Each table (users, logs, predictions) has a repository in [`handlers`] that
//! wraps a `SqliteConnection` and exposes strongly-typed operations, returning
//! the domain models in [`models`]. Errors are normalized into
//! [`errors::DbError`] so handlers can match on constraint violations without
//! touching sqlx internals.

pub mod errors;
pub mod handlers;
pub mod models;
