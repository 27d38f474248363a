//! Token lifecycle: issuance, validation and revocation.
//!
//! Tokens are HS256 JWTs. The issuer claim tells access tokens apart from
//! refresh tokens. Only refresh tokens can be revoked; revocation appends the
//! raw token string to the store's denylist.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chirpy_db::{Database, StoreError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Access,
    Refresh,
}

impl TokenRole {
    pub fn issuer(self) -> &'static str {
        match self {
            Self::Access => "chirpy-access",
            Self::Refresh => "chirpy-refresh",
        }
    }

    pub fn lifetime(self) -> Duration {
        match self {
            Self::Access => Duration::hours(1),
            Self::Refresh => Duration::days(60),
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, string-encoded.
    pub sub: String,
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed or badly signed token")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("not a {expected} token")]
    WrongRole { expected: TokenRole },

    #[error("token has been revoked")]
    Revoked,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: UserId, role: TokenRole) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: UserId,
        role: TokenRole,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iss: role.issuer().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + role.lifetime()).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Check signature, then expiry, then role. Pure; never touches the store.
    pub fn validate(&self, token: &str, role: TokenRole) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.iss != role.issuer() {
            return Err(TokenError::WrongRole { expected: role });
        }

        Ok(data.claims)
    }

    /// Validate a refresh token and make sure it is not on the denylist.
    /// Blocks on the store lock.
    pub fn validate_refresh(&self, token: &str, db: &Database) -> Result<Claims, TokenError> {
        let claims = self.validate(token, TokenRole::Refresh)?;

        match db.get_revoked_token(token) {
            Ok(_) => Err(TokenError::Revoked),
            Err(StoreError::NotExist) => Ok(claims),
            Err(e) => Err(e.into()),
        }
    }

    /// Put a refresh token on the denylist. Fails with
    /// `StoreError::AlreadyRevoked` when it is already there.
    pub fn revoke(&self, token: &str, db: &Database) -> Result<(), TokenError> {
        self.validate(token, TokenRole::Refresh)?;
        db.add_revoked_token(token)?;
        Ok(())
    }
}
