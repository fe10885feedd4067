//! HTTP surface: request/response models, handlers, and page rendering.

pub mod handlers;
pub mod models;
pub mod render;
