//! Repository implementations for database access.
//!
//! Each repository wraps a `SqliteConnection` (or transaction) and provides
//! strongly-typed operations returning models from [`crate::db::models`].
//! Every write is a single atomic INSERT; no repository method spans multiple
//! statements, so a failed request can never leave a half-written record.

pub mod audit;
pub mod predictions;
pub mod users;

pub use audit::AuditLog;
pub use predictions::Predictions;
pub use users::Users;
