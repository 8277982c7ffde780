use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;

/// Fresh hex document id. Documents carry their id in an `id` field and are
/// always queried by it.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2id hash in PHC format. Never serialized into a response body;
    /// responses carry a [`UserSummary`] instead.
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    /// Display date chosen by the creator, kept as an opaque string.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Running sum of the trip's expense amounts. Mutated only through
    /// `$inc` so concurrent expense edits cannot lose updates.
    pub total: f64,
    pub share: f64,
    pub image: String,
    /// User ids of everyone on the trip. The creator is always a member.
    pub participants: Vec<UserId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.created_by == user_id || self.participants.iter().any(|p| p == user_id)
    }

    pub fn has_ended(&self, today: DateTime<Utc>) -> bool {
        self.end_date.map(|end| end < today).unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    /// User id of the participant who paid.
    pub paid_by: UserId,
    pub date: DateTime<Utc>,
    pub trip_id: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    TripInvite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Accepted => "ACCEPTED",
            NotificationStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient: UserId,
    pub sender: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub trip_id: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn trip_invite(recipient: &str, sender: &str, trip_id: &str) -> Self {
        Notification {
            id: new_id(),
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            kind: NotificationKind::TripInvite,
            trip_id: trip_id.to_string(),
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
