//! Record types persisted in the JSON document.
//! Distinct from chirpy-types API models to keep the store layer independent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChirpId = u32;
pub type UserId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: ChirpId,
    pub body: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Argon2 PHC string. Never the plaintext.
    pub password: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    /// The raw token string doubles as the revocation key.
    pub id: String,
    pub revoked_at: DateTime<Utc>,
}

/// The whole persisted aggregate. Every store operation reads and rewrites it
/// wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chirps: BTreeMap<ChirpId, Chirp>,
    #[serde(default)]
    pub users: BTreeMap<UserId, User>,
    #[serde(default)]
    pub revoked_tokens: BTreeMap<String, RevokedToken>,
}
