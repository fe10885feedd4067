use serde::{Deserialize, Serialize};

/// Login form body (`POST /`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
