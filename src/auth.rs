use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ApiError;

pub const ACCESS_TOKEN_DAYS: i64 = 1;
pub const REFRESH_TOKEN_DAYS: i64 = 30;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs an HS256 token for the user. Access and refresh tokens share the
/// claim shape and differ only in secret and lifetime.
pub fn issue_token(
    user_id: &str,
    email: &str,
    secret: &str,
    valid_days: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(valid_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("failed to encode token: {err}")))
}

/// Validates signature and expiry. Callers map the error to 401 or 403
/// depending on which kind of token they were handed.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| ApiError::Internal(format!("stored password hash is invalid: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(ApiError::Internal(format!(
            "failed to verify password: {err}"
        ))),
    }
}

/// The caller identified by the Bearer token on the request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::Internal("app config is not registered".to_string()))?;
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Access Denied".to_string()))?;
    let token =
        bearer_token(header).ok_or_else(|| ApiError::Unauthorized("Access Denied".to_string()))?;
    let claims = decode_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid Token".to_string()))?;
    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    })
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = issue_token("u1", "ana@example.com", "secret", 1).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token("u1", "ana@example.com", "secret", 1).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("u1", "ana@example.com", "secret", -2).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(decode_token("not.a.token", "secret").is_err());
    }

    #[test]
    fn bearer_token_strips_the_scheme() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn invalid_stored_hash_is_an_error() {
        assert!(verify_password("hunter2", "not-a-phc-hash").is_err());
    }
}
