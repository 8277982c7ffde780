use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::db::Stores;
use crate::error::ApiError;
use crate::schemas::{NotificationKind, NotificationStatus, UserSummary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripRef {
    id: String,
    title: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationJson {
    id: String,
    #[serde(rename = "type")]
    kind: NotificationKind,
    status: NotificationStatus,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<UserSummary>,
    /// Absent when the referenced trip has been deleted since.
    #[serde(skip_serializing_if = "Option::is_none")]
    trip: Option<TripRef>,
}

#[get("")]
async fn list_notifications(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let notifications = stores
        .notifications
        .find_for_recipient(&auth_user.user_id)
        .await?;

    let mut sender_ids: Vec<String> = notifications.iter().map(|n| n.sender.clone()).collect();
    sender_ids.sort();
    sender_ids.dedup();
    let senders: HashMap<String, UserSummary> = stores
        .users
        .find_by_ids(&sender_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user.summary()))
        .collect();

    let mut out = Vec::with_capacity(notifications.len());
    for notification in notifications {
        let trip = stores
            .trips
            .find_by_id(&notification.trip_id)
            .await?
            .map(|trip| TripRef {
                id: trip.id,
                title: trip.title,
            });
        out.push(NotificationJson {
            id: notification.id,
            kind: notification.kind,
            status: notification.status,
            created_at: notification.created_at,
            sender: senders.get(&notification.sender).cloned(),
            trip,
        });
    }

    Ok(HttpResponse::Ok().json(out))
}

#[post("/{id}/accept")]
async fn accept_notification(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut notification = stores
        .notifications
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    if notification.recipient != auth_user.user_id {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }

    if notification.kind == NotificationKind::TripInvite {
        // The trip may be gone by now; accepting then only settles the
        // notification itself.
        if let Some(trip) = stores.trips.find_by_id(&notification.trip_id).await? {
            stores
                .trips
                .add_participant(&trip.id, &auth_user.user_id)
                .await?;
        }
    }

    stores
        .notifications
        .set_status(&notification.id, NotificationStatus::Accepted)
        .await?;
    notification.status = NotificationStatus::Accepted;

    Ok(HttpResponse::Ok().json(json!({
        "msg": "Invitation accepted",
        "notification": notification,
    })))
}

#[post("/{id}/reject")]
async fn reject_notification(
    stores: web::Data<Stores>,
    auth_user: AuthUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut notification = stores
        .notifications
        .find_by_id(&id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    if notification.recipient != auth_user.user_id {
        return Err(ApiError::Unauthorized("Not authorized".to_string()));
    }

    stores
        .notifications
        .set_status(&notification.id, NotificationStatus::Rejected)
        .await?;
    notification.status = NotificationStatus::Rejected;

    Ok(HttpResponse::Ok().json(json!({
        "msg": "Invitation rejected",
        "notification": notification,
    })))
}
