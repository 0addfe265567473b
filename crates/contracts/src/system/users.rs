use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
        }
    }

    pub fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "admin" => Some(UserRole::Admin),
            "client" => Some(UserRole::Client),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
}

/// Admin edit of another account. Passwords are not editable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}
