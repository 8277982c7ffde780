use actix_web::{delete, get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::db::{ExpenseSource, Stores};
use crate::error::ApiError;
use crate::routes::trips::today_utc;
use crate::schemas::{new_id, Expense};

#[get("/{trip_id}")]
async fn list_expenses(
    stores: web::Data<Stores>,
    _auth_user: AuthUser,
    trip_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let expenses = stores
        .expenses
        .expenses_for_trip(&trip_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(expenses))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExpenseJson {
    description: String,
    amount: f64,
    /// User id of the paying participant.
    paid_by: String,
    trip_id: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[post("")]
async fn create_expense(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    json: web::Json<CreateExpenseJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    let trip = stores
        .trips
        .find_by_id(&json.trip_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if !trip.is_member(&auth_user.user_id) {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }
    if trip.has_ended(today_utc()) {
        return Err(ApiError::BadRequest(
            "Cannot add expense to a past trip".to_string(),
        ));
    }
    if !json.amount.is_finite() || json.amount <= 0.0 {
        return Err(ApiError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }
    if !trip.is_member(&json.paid_by) {
        return Err(ApiError::BadRequest(
            "Payer must be a trip participant".to_string(),
        ));
    }

    let expense = Expense {
        id: new_id(),
        description: json.description,
        amount: json.amount,
        paid_by: json.paid_by,
        date: json.date.unwrap_or_else(Utc::now),
        trip_id: trip.id.clone(),
        created_by: auth_user.user_id.clone(),
        created_at: Utc::now(),
    };
    stores.expenses.insert(&expense).await?;
    stores.trips.add_to_total(&trip.id, expense.amount).await?;

    Ok(HttpResponse::Ok().json(expense))
}

#[delete("/{id}")]
async fn delete_expense(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let expense = stores
        .expenses
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Expense not found".to_string()))?;
    if expense.created_by != auth_user.user_id {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }

    // Reverse the running total before the expense disappears.
    stores
        .trips
        .add_to_total(&expense.trip_id, -expense.amount)
        .await?;
    stores.expenses.delete(&expense.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "msg": "Expense removed" })))
}
