use chrono::Utc;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::{Chirp, ChirpId, RevokedToken, User, UserId};
use crate::Database;

impl Database {
    // -- Chirps --

    /// Insert a chirp with id one greater than the current maximum, so ids keep
    /// increasing even after deletions.
    pub fn create_chirp(&self, body: &str, author_id: UserId) -> Result<Chirp> {
        self.with_document_mut(|doc| {
            let id = doc.chirps.keys().next_back().map_or(1, |max| max + 1);
            let chirp = Chirp {
                id,
                body: body.to_string(),
                author_id,
            };
            doc.chirps.insert(id, chirp.clone());
            debug!("Created chirp {} by user {}", id, author_id);
            Ok(chirp)
        })
    }

    /// All chirps, or only those by `author_id`. Order is not part of the
    /// contract; callers sort.
    pub fn list_chirps(&self, author_id: Option<UserId>) -> Result<Vec<Chirp>> {
        self.with_document(|doc| {
            Ok(doc
                .chirps
                .values()
                .filter(|c| author_id.is_none_or(|a| c.author_id == a))
                .cloned()
                .collect())
        })
    }

    pub fn get_chirp(&self, id: ChirpId) -> Result<Chirp> {
        self.with_document(|doc| doc.chirps.get(&id).cloned().ok_or(StoreError::NotExist))
    }

    /// Remove a chirp. Authorship is the caller's concern.
    pub fn delete_chirp(&self, id: ChirpId) -> Result<()> {
        self.with_document_mut(|doc| {
            doc.chirps.remove(&id).ok_or(StoreError::NotExist)?;
            debug!("Deleted chirp {}", id);
            Ok(())
        })
    }

    /// Remove a chirp only if `author_id` wrote it. The ownership check and
    /// the removal share one critical section, so a freed id reused by
    /// another author can never be deleted on a stale check.
    pub fn delete_chirp_by(&self, id: ChirpId, author_id: UserId) -> Result<()> {
        self.with_document_mut(|doc| {
            let chirp = doc.chirps.get(&id).ok_or(StoreError::NotExist)?;
            if chirp.author_id != author_id {
                return Err(StoreError::NotAuthor);
            }
            doc.chirps.remove(&id);
            debug!("User {} deleted chirp {}", author_id, id);
            Ok(())
        })
    }

    // -- Users --

    /// Register a user. Ids are `count + 1`: users are never deleted, so this
    /// stays dense, but an occupied slot is refused rather than overwritten.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        self.with_document_mut(|doc| {
            if doc.users.values().any(|u| u.email == email) {
                return Err(StoreError::AlreadyExists);
            }

            let id = doc.users.len() as UserId + 1;
            if doc.users.contains_key(&id) {
                return Err(StoreError::Corrupt(format!("user id {} already taken", id)));
            }

            let user = User {
                id,
                email: email.to_string(),
                password: password_hash.to_string(),
                is_chirpy_red: false,
            };
            doc.users.insert(id, user.clone());
            debug!("Created user {}", id);
            Ok(user)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.with_document(|doc| {
            doc.users
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or(StoreError::NotExist)
        })
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<User> {
        self.with_document(|doc| doc.users.get(&id).cloned().ok_or(StoreError::NotExist))
    }

    /// Overwrite both email and password hash. There is no partial update:
    /// callers must always pass both. Taking another user's email fails with
    /// `AlreadyExists`.
    pub fn update_user(&self, id: UserId, email: &str, password_hash: &str) -> Result<User> {
        self.with_document_mut(|doc| {
            if doc.users.values().any(|u| u.id != id && u.email == email) {
                return Err(StoreError::AlreadyExists);
            }
            let user = doc.users.get_mut(&id).ok_or(StoreError::NotExist)?;
            user.email = email.to_string();
            user.password = password_hash.to_string();
            Ok(user.clone())
        })
    }

    /// Flip the Chirpy Red flag on. There is no way back.
    pub fn upgrade_user(&self, id: UserId) -> Result<User> {
        self.with_document_mut(|doc| {
            let user = doc.users.get_mut(&id).ok_or(StoreError::NotExist)?;
            user.is_chirpy_red = true;
            Ok(user.clone())
        })
    }

    // -- Revoked tokens --

    pub fn add_revoked_token(&self, token: &str) -> Result<RevokedToken> {
        self.with_document_mut(|doc| {
            if doc.revoked_tokens.contains_key(token) {
                return Err(StoreError::AlreadyRevoked);
            }
            let revoked = RevokedToken {
                id: token.to_string(),
                revoked_at: Utc::now(),
            };
            doc.revoked_tokens.insert(token.to_string(), revoked.clone());
            Ok(revoked)
        })
    }

    pub fn get_revoked_token(&self, token: &str) -> Result<RevokedToken> {
        self.with_document(|doc| {
            doc.revoked_tokens
                .get(token)
                .cloned()
                .ok_or(StoreError::NotExist)
        })
    }
}
