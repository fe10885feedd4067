//! Request and response models for the HTTP surface.

pub mod auth;
pub mod predictions;
pub mod users;
