//! Authentication Models
//! Mission: Define user account and token payload data structures

use crate::auth::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted user account row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub member_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub profile_image_url: Option<String>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub last_login_date_display: Option<DateTime<Utc>>,
    pub date_of_join: DateTime<Utc>,
    pub role: Role,
    pub active: bool,
    pub not_locked: bool,
}

/// JWT Claims payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // subject (username)
    pub authorities: Vec<String>,
    pub iss: String,
    pub iat: usize,
    pub exp: usize, // expiration timestamp
}

/// Verified identity attached to a request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub authorities: Vec<String>,
}

impl AuthContext {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Self-service registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

/// Admin user creation request body.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub active: bool,
    pub not_locked: bool,
}

/// Admin user update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub current_username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub active: bool,
    pub not_locked: bool,
}

/// User response (sanitized - no credential material).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub member_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub last_login_date_display: Option<DateTime<Utc>>,
    pub date_of_join: DateTime<Utc>,
    pub role: Role,
    pub authorities: Vec<String>,
    pub active: bool,
    pub not_locked: bool,
}

impl UserResponse {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            member_id: record.member_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            username: record.username.clone(),
            profile_image_url: record.profile_image_url.clone(),
            last_login_date_display: record.last_login_date_display,
            date_of_join: record.date_of_join,
            role: record.role,
            authorities: record.role.authorities().iter().map(|a| a.to_string()).collect(),
            active: record.active,
            not_locked: record.not_locked,
        }
    }
}
