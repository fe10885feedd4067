//! Database entity models (DB request/response shapes).

pub mod audit;
pub mod predictions;
pub mod users;
