//! # Sessions
//!
//! - Passwords are stored as Argon2 PHC strings
//! - `session_token` cookie holds `{user_id}.{hex HMAC-SHA256 of user_id}`
//! - Tokens do not expire; rotating `SECRET_KEY` logs everyone out
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::{database::UserId, error::AppError, state::State};

pub const SESSION_COOKIE: &str = "session_token";

type HmacSha256 = Hmac<Sha256>;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AppError::InternalError(e.to_string().into()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(e.to_string().into()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(secret_key: &str) -> Result<Self, AppError> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .map_err(|e| AppError::InternalError(e.to_string().into()))?;

        Ok(Self { mac })
    }

    pub fn sign(&self, user_id: UserId) -> String {
        let mut mac = self.mac.clone();
        mac.update(user_id.to_string().as_bytes());

        format!("{user_id}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, token: &str) -> Option<UserId> {
        let (user_id, signature) = token.split_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        user_id.parse().ok()
    }

    pub fn cookie(&self, user_id: UserId) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.sign(user_id)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// The logged-in user behind the request's session cookie.
pub struct CurrentUser(pub UserId);

impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .ok_or(AppError::Unauthorized("Login required"))?;

        let user_id = state
            .sessions
            .verify(token.value())
            .ok_or(AppError::Unauthorized("Invalid session"))?;

        if !state.store.user_exists(user_id).await? {
            return Err(AppError::Unauthorized("User not found"));
        }

        Ok(CurrentUser(user_id))
    }
}
