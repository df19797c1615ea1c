//! Data Transfer Objects - request/response types for the session endpoints.

use serde::{Deserialize, Serialize};

/// Request to log in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Where to go after a successful login.
    pub next: Option<String>,
}

/// Response containing the issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Server health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub timestamp: String,
}
