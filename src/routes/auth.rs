use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::{self, AuthUser, ACCESS_TOKEN_DAYS, REFRESH_TOKEN_DAYS};
use crate::config::AppConfig;
use crate::db::Stores;
use crate::error::ApiError;
use crate::schemas::{new_id, User, UserSummary};

#[derive(Deserialize)]
struct RegisterJson {
    username: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginJson {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionJson {
    user: UserSummary,
    token: String,
    refresh_token: String,
}

fn open_session(user: &User, config: &AppConfig) -> Result<SessionJson, ApiError> {
    Ok(SessionJson {
        user: user.summary(),
        token: auth::issue_token(&user.id, &user.email, &config.jwt_secret, ACCESS_TOKEN_DAYS)?,
        refresh_token: auth::issue_token(
            &user.id,
            &user.email,
            &config.refresh_secret,
            REFRESH_TOKEN_DAYS,
        )?,
    })
}

#[post("/register")]
async fn register(
    stores: web::Data<Stores>,
    config: web::Data<AppConfig>,
    json: web::Json<RegisterJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    if json.username.is_empty() || json.email.is_empty() || json.password.is_empty() {
        return Err(ApiError::BadRequest("All input is required".to_string()));
    }

    let email = json.email.to_lowercase();
    if stores.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User Already Exist. Please Login".to_string(),
        ));
    }

    let user = User {
        id: new_id(),
        username: json.username,
        email,
        password: auth::hash_password(&json.password)?,
        created_at: Utc::now(),
    };
    stores.users.insert(&user).await?;
    info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(open_session(&user, &config)?))
}

#[post("/login")]
async fn login(
    stores: web::Data<Stores>,
    config: web::Data<AppConfig>,
    json: web::Json<LoginJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    if json.email.is_empty() || json.password.is_empty() {
        return Err(ApiError::BadRequest("All input is required".to_string()));
    }

    let user = stores
        .users
        .find_by_email(&json.email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid Credentials".to_string()))?;
    if !auth::verify_password(&json.password, &user.password)? {
        return Err(ApiError::BadRequest("Invalid Credentials".to_string()));
    }

    Ok(HttpResponse::Ok().json(open_session(&user, &config)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshJson {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[post("/refresh")]
async fn refresh(
    config: web::Data<AppConfig>,
    json: web::Json<RefreshJson>,
) -> Result<HttpResponse, ApiError> {
    let refresh_token = json
        .into_inner()
        .refresh_token
        .ok_or_else(|| ApiError::Unauthorized("Refresh Token Required".to_string()))?;
    let claims = auth::decode_token(&refresh_token, &config.refresh_secret)
        .map_err(|_| ApiError::Forbidden("Invalid Refresh Token".to_string()))?;

    let token = auth::issue_token(
        &claims.user_id,
        &claims.email,
        &config.jwt_secret,
        ACCESS_TOKEN_DAYS,
    )?;
    Ok(HttpResponse::Ok().json(json!({ "token": token })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordJson {
    current_password: String,
    new_password: String,
}

#[post("/change-password")]
async fn change_password(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    json: web::Json<ChangePasswordJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    let user = stores
        .users
        .find_by_id(&auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if !auth::verify_password(&json.current_password, &user.password)? {
        return Err(ApiError::BadRequest("Invalid current password".to_string()));
    }

    let password_hash = auth::hash_password(&json.new_password)?;
    stores.users.set_password(&user.id, &password_hash).await?;

    Ok(HttpResponse::Ok().json(json!({ "msg": "Password updated successfully" })))
}
