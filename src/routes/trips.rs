use std::collections::HashMap;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::AuthUser;
use crate::db::Stores;
use crate::error::ApiError;
use crate::images::ImageSearch;
use crate::schemas::{new_id, Notification, Trip, UserSummary};

/// Midnight UTC of the current day, the cutoff for "past" trips.
pub(crate) fn today_utc() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripListQuery {
    page: Option<usize>,
    limit: Option<usize>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    status: Option<String>,
}

/// A trip with its participant ids resolved to user summaries.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripJson {
    id: String,
    title: String,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    total: f64,
    share: f64,
    image: String,
    participants: Vec<UserSummary>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl TripJson {
    fn new(trip: Trip, summaries: &HashMap<String, UserSummary>) -> Self {
        let participants = trip
            .participants
            .iter()
            .filter_map(|id| summaries.get(id).cloned())
            .collect();
        TripJson {
            id: trip.id,
            title: trip.title,
            date: trip.date,
            start_date: trip.start_date,
            end_date: trip.end_date,
            total: trip.total,
            share: trip.share,
            image: trip.image,
            participants,
            created_by: trip.created_by,
            created_at: trip.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripListJson {
    trips: Vec<TripJson>,
    total_pages: usize,
    current_page: usize,
    total_trips: usize,
}

async fn resolve_participants(
    stores: &Stores,
    trips: &[Trip],
) -> Result<HashMap<String, UserSummary>, ApiError> {
    let mut ids: Vec<String> = trips
        .iter()
        .flat_map(|trip| trip.participants.iter().cloned())
        .collect();
    ids.sort();
    ids.dedup();
    let users = stores.users.find_by_ids(&ids).await?;
    Ok(users
        .into_iter()
        .map(|user| (user.id.clone(), user.summary()))
        .collect())
}

fn filter_by_status(trips: Vec<Trip>, status: &str, today: DateTime<Utc>) -> Vec<Trip> {
    match status {
        "ongoing" => trips
            .into_iter()
            .filter(|trip| !trip.has_ended(today))
            .collect(),
        "past" => trips
            .into_iter()
            .filter(|trip| trip.has_ended(today))
            .collect(),
        _ => trips,
    }
}

fn sort_trips(trips: &mut [Trip], sort_by: &str, descending: bool) {
    trips.sort_by(|a, b| {
        let ordering = match sort_by {
            "title" => a.title.cmp(&b.title),
            "total" => a
                .total
                .partial_cmp(&b.total)
                .unwrap_or(std::cmp::Ordering::Equal),
            "createdAt" => a.created_at.cmp(&b.created_at),
            "startDate" => a.start_date.cmp(&b.start_date),
            _ => a.date.cmp(&b.date),
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn paginate(trips: Vec<Trip>, page: usize, limit: usize) -> Vec<Trip> {
    trips.into_iter().skip((page - 1) * limit).take(limit).collect()
}

#[get("")]
async fn list_trips(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    query: web::Query<TripListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).max(1);
    let status = query.status.as_deref().unwrap_or("all");
    let sort_by = query.sort_by.as_deref().unwrap_or("date");
    let descending = query.sort_order.as_deref().unwrap_or("desc") != "asc";

    let trips = stores
        .trips
        .find_for_member(&auth_user.user_id, query.search.as_deref())
        .await?;
    let mut trips = filter_by_status(trips, status, today_utc());
    sort_trips(&mut trips, sort_by, descending);

    let total_trips = trips.len();
    let total_pages = total_trips.div_ceil(limit);
    let page_trips = paginate(trips, page, limit);

    let summaries = resolve_participants(&stores, &page_trips).await?;
    let trips = page_trips
        .into_iter()
        .map(|trip| TripJson::new(trip, &summaries))
        .collect();

    Ok(HttpResponse::Ok().json(TripListJson {
        trips,
        total_pages,
        current_page: page,
        total_trips,
    }))
}

#[get("/{id}")]
async fn get_trip(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let trip = stores
        .trips
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if !trip.is_member(&auth_user.user_id) {
        return Err(ApiError::Forbidden(
            "Not authorized to view this trip".to_string(),
        ));
    }

    let summaries = resolve_participants(&stores, std::slice::from_ref(&trip)).await?;
    Ok(HttpResponse::Ok().json(TripJson::new(trip, &summaries)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTripJson {
    title: String,
    date: String,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    /// User ids to invite on creation.
    #[serde(default)]
    participants: Vec<String>,
}

#[post("")]
async fn create_trip(
    stores: web::Data<Stores>,
    images: web::Data<ImageSearch>,
    auth_user: AuthUser,
    json: web::Json<CreateTripJson>,
) -> Result<HttpResponse, ApiError> {
    let json = json.into_inner();
    if stores
        .trips
        .find_by_title_and_creator(&json.title, &auth_user.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "You already have a trip with this name.".to_string(),
        ));
    }

    let image = images.image_for(&json.title).await;
    let trip = Trip {
        id: new_id(),
        title: json.title,
        date: json.date,
        start_date: json.start_date,
        end_date: json.end_date,
        total: 0.0,
        share: 0.0,
        image,
        participants: vec![auth_user.user_id.clone()],
        created_by: auth_user.user_id.clone(),
        created_at: Utc::now(),
    };
    stores.trips.insert(&trip).await?;

    let invites: Vec<Notification> = json
        .participants
        .iter()
        .filter(|invitee| **invitee != auth_user.user_id)
        .map(|invitee| Notification::trip_invite(invitee, &auth_user.user_id, &trip.id))
        .collect();
    stores.notifications.insert_many(&invites).await?;

    Ok(HttpResponse::Ok().json(trip))
}

#[derive(Deserialize)]
struct UpdateTripJson {
    title: Option<String>,
    date: Option<String>,
}

#[put("/{id}")]
async fn update_trip(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
    json: web::Json<UpdateTripJson>,
) -> Result<HttpResponse, ApiError> {
    let mut trip = stores
        .trips
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if trip.created_by != auth_user.user_id {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }

    let json = json.into_inner();
    if let Some(title) = json.title.filter(|t| !t.is_empty()) {
        trip.title = title;
    }
    if let Some(date) = json.date.filter(|d| !d.is_empty()) {
        trip.date = date;
    }
    stores
        .trips
        .update_details(&trip.id, &trip.title, &trip.date)
        .await?;

    Ok(HttpResponse::Ok().json(trip))
}

#[delete("/{id}")]
async fn delete_trip(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let trip = stores
        .trips
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if trip.created_by != auth_user.user_id {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }

    // Expenses and pending invites must not outlive their trip.
    stores.expenses.delete_for_trip(&trip.id).await?;
    stores.notifications.delete_for_trip(&trip.id).await?;
    stores.trips.delete(&trip.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "msg": "Trip removed" })))
}

#[post("/{id}/leave")]
async fn leave_trip(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let trip = stores
        .trips
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if trip.created_by == auth_user.user_id {
        return Err(ApiError::BadRequest(
            "Creator cannot leave the trip. Delete it instead.".to_string(),
        ));
    }
    if !trip.participants.iter().any(|p| p == &auth_user.user_id) {
        return Err(ApiError::BadRequest(
            "User is not a participant".to_string(),
        ));
    }

    stores
        .trips
        .remove_participant(&trip.id, &auth_user.user_id)
        .await?;
    info!("user {} left trip {}", auth_user.user_id, trip.id);

    Ok(HttpResponse::Ok().json(json!({ "msg": "Left trip successfully" })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteJson {
    user_id: String,
}

#[post("/{id}/participants")]
async fn invite_participant(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
    json: web::Json<InviteJson>,
) -> Result<HttpResponse, ApiError> {
    let trip = stores
        .trips
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;
    if !trip.is_member(&auth_user.user_id) {
        return Err(ApiError::Forbidden(
            "Not authorized to add participants to this trip".to_string(),
        ));
    }

    let json = json.into_inner();
    if trip.participants.contains(&json.user_id) {
        return Err(ApiError::BadRequest(
            "User is already a participant".to_string(),
        ));
    }
    if stores
        .notifications
        .pending_invite_exists(&json.user_id, &trip.id)
        .await?
    {
        return Err(ApiError::BadRequest(
            "Invitation already sent to this user".to_string(),
        ));
    }

    stores
        .notifications
        .insert(&Notification::trip_invite(
            &json.user_id,
            &auth_user.user_id,
            &trip.id,
        ))
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "msg": "Invitation sent successfully" })))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn trip(title: &str, date: &str, ended_days_ago: Option<i64>) -> Trip {
        let now = Utc::now();
        Trip {
            id: new_id(),
            title: title.to_string(),
            date: date.to_string(),
            start_date: None,
            end_date: ended_days_ago.map(|days| now - Duration::days(days)),
            total: 0.0,
            share: 0.0,
            image: String::new(),
            participants: vec!["ana".to_string()],
            created_by: "ana".to_string(),
            created_at: now,
        }
    }

    #[test]
    fn status_filter_splits_past_and_ongoing() {
        let trips = vec![
            trip("past trip", "May 2026", Some(3)),
            trip("open ended", "August 2026", None),
        ];
        let today = today_utc();

        let ongoing = filter_by_status(trips.clone(), "ongoing", today);
        assert_eq!(ongoing.len(), 1);
        assert_eq!(ongoing[0].title, "open ended");

        let past = filter_by_status(trips.clone(), "past", today);
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].title, "past trip");

        assert_eq!(filter_by_status(trips, "all", today).len(), 2);
    }

    #[test]
    fn trips_sort_by_title_in_both_directions() {
        let mut trips = vec![
            trip("b", "2026-02", None),
            trip("c", "2026-03", None),
            trip("a", "2026-01", None),
        ];

        sort_trips(&mut trips, "title", false);
        let titles: Vec<&str> = trips.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);

        sort_trips(&mut trips, "title", true);
        let titles: Vec<&str> = trips.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["c", "b", "a"]);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_date() {
        let mut trips = vec![trip("b", "2026-02", None), trip("a", "2026-01", None)];
        sort_trips(&mut trips, "whatever", false);
        assert_eq!(trips[0].title, "a");
    }

    #[test]
    fn pagination_clips_to_the_requested_window() {
        let trips: Vec<Trip> = (0..5)
            .map(|i| trip(&format!("t{i}"), "2026", None))
            .collect();

        let page_two = paginate(trips.clone(), 2, 2);
        let titles: Vec<&str> = page_two.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["t2", "t3"]);

        assert!(paginate(trips, 4, 2).is_empty());
    }
}
