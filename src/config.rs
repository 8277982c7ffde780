use std::{env, net::SocketAddr};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub listen_addr: SocketAddr,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub refresh_secret: String,
    /// Unsplash API key for trip cover images. Optional; trips fall back to
    /// the default cover when unset.
    pub unsplash_access_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| ApiError::Config("You need to add the MONGODB_URI to the env".into()))?;
        let database_name =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "tripsplit".to_string());
        let listen_addr: SocketAddr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|err| ApiError::Config(format!("invalid LISTEN_ADDR: {err}")))?;
        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ApiError::Config("You need to add the JWT_SECRET to the env".into()))?;
        let refresh_secret = env::var("REFRESH_SECRET")
            .map_err(|_| ApiError::Config("You need to add the REFRESH_SECRET to the env".into()))?;
        let unsplash_access_key = env::var("UNSPLASH_ACCESS_KEY").ok();

        Ok(Self {
            mongodb_uri,
            database_name,
            listen_addr,
            cors_origin,
            jwt_secret,
            refresh_secret,
            unsplash_access_key,
        })
    }
}
