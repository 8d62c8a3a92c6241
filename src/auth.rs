use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{error::ApiError, models::SoftDelete, repository::RepositoryState};

/// AuthUser
///
/// The resolved identity of an authenticated request: the principal's uuid
/// plus its role claims. Services receive this explicitly instead of reading
/// any ambient security context.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uuid: Uuid,
    pub username: String,
    pub roles: HashSet<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains("ADMIN")
    }
}

/// Hashes a plaintext password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Internal
        })
}

/// Verifies a plaintext password against a stored argon2 hash string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash unparseable: {:?}", e);
            false
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Resolves HTTP Basic credentials against the person store on every request:
/// decode the Authorization header, look the account up by username, reject
/// hidden (deleted/locked/disabled) accounts, verify the password hash.
///
/// Rejection is always `ApiError::Unauthorized` (401) regardless of which
/// step failed, so the response does not reveal whether a username exists.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or(ApiError::Unauthorized)?;

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| ApiError::Unauthorized)?;
        let decoded = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

        // The password part may itself contain ':', only the first one splits.
        let (username, password) = decoded.split_once(':').ok_or(ApiError::Unauthorized)?;

        let person = repo
            .find_person_by_username(username)
            .await
            .ok_or(ApiError::Unauthorized)?;

        // An account that is soft-deleted, locked or disabled can not log in,
        // even with correct credentials.
        if person.is_hidden() {
            return Err(ApiError::Unauthorized);
        }

        if !verify_password(password, &person.password) {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            uuid: person.uuid,
            username: person.username,
            roles: person.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn admin_claim() {
        let mut user = AuthUser {
            uuid: Uuid::new_v4(),
            username: "user".into(),
            roles: HashSet::from(["USER".to_string()]),
        };
        assert!(!user.is_admin());
        user.roles.insert("ADMIN".to_string());
        assert!(user.is_admin());
    }
}
