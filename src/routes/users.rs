use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::balance::balance_for_user;
use crate::db::Stores;
use crate::error::ApiError;
use crate::schemas::{User, UserSummary};

#[get("/balance")]
async fn get_balance(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let user = stores
        .users
        .find_by_id(&auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let balance = balance_for_user(&user.id, &stores.trips, &stores.expenses).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[derive(Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

#[get("/search")]
async fn search_users(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let Some(term) = query.into_inner().query.filter(|q| !q.is_empty()) else {
        return Ok(HttpResponse::Ok().json(Vec::<UserSummary>::new()));
    };

    let users = stores.users.search(&term, &auth_user.user_id, 5).await?;
    let summaries: Vec<UserSummary> = users.iter().map(User::summary).collect();
    Ok(HttpResponse::Ok().json(summaries))
}
