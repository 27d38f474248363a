use serde::{Deserialize, Serialize};

// -- Users --

/// Body of `POST /api/users` and `PUT /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u32,
    pub email: String,
    pub is_chirpy_red: bool,
}

// -- Auth --

pub type LoginRequest = UserCredentials;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: u32,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

// -- Chirps --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChirpResponse {
    pub id: u32,
    pub body: String,
    pub author_id: u32,
}

// -- Webhooks --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolkaWebhook {
    pub event: String,
    pub data: PolkaWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolkaWebhookData {
    pub user_id: u32,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
