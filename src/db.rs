use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::FindOptions, Client, Collection};

use crate::error::ApiError;
use crate::schemas::{Expense, Notification, NotificationStatus, Trip, User};

/// Trips a user takes part in. One of the two reads feeding the balance
/// computation.
#[async_trait]
pub trait TripSource {
    async fn trips_for_participant(&self, user_id: &str) -> Result<Vec<Trip>, ApiError>;
}

/// A trip's full expense list, newest first. The other balance read.
#[async_trait]
pub trait ExpenseSource {
    async fn expenses_for_trip(&self, trip_id: &str) -> Result<Vec<Expense>, ApiError>;
}

#[derive(Clone)]
pub struct Stores {
    pub users: UserStore,
    pub trips: TripStore,
    pub expenses: ExpenseStore,
    pub notifications: NotificationStore,
}

impl Stores {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Stores {
            users: UserStore {
                collection: db.collection("users"),
            },
            trips: TripStore {
                collection: db.collection("trips"),
            },
            expenses: ExpenseStore {
                collection: db.collection("expenses"),
            },
            notifications: NotificationStore {
                collection: db.collection("notifications"),
            },
        }
    }
}

#[derive(Clone)]
pub struct UserStore {
    collection: Collection<User>,
}

impl UserStore {
    pub async fn insert(&self, user: &User) -> Result<(), ApiError> {
        self.collection.insert_one(user, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        Ok(self.collection.find_one(doc! { "id": id }, None).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .collection
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, ApiError> {
        let cursor = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn set_password(&self, id: &str, password_hash: &str) -> Result<(), ApiError> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "password": password_hash } },
                None,
            )
            .await?;
        Ok(())
    }

    /// Case-insensitive substring match over username or email, excluding
    /// the searching user.
    pub async fn search(
        &self,
        query: &str,
        exclude_id: &str,
        limit: i64,
    ) -> Result<Vec<User>, ApiError> {
        let filter = doc! {
            "$and": [
                { "id": { "$ne": exclude_id } },
                { "$or": [
                    { "email": { "$regex": query, "$options": "i" } },
                    { "username": { "$regex": query, "$options": "i" } },
                ] },
            ]
        };
        let options = FindOptions::builder().limit(limit).build();
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[derive(Clone)]
pub struct TripStore {
    collection: Collection<Trip>,
}

impl TripStore {
    pub async fn insert(&self, trip: &Trip) -> Result<(), ApiError> {
        self.collection.insert_one(trip, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Trip>, ApiError> {
        Ok(self.collection.find_one(doc! { "id": id }, None).await?)
    }

    pub async fn find_by_title_and_creator(
        &self,
        title: &str,
        creator: &str,
    ) -> Result<Option<Trip>, ApiError> {
        Ok(self
            .collection
            .find_one(doc! { "title": title, "createdBy": creator }, None)
            .await?)
    }

    /// Every trip the user created or joined, optionally narrowed by a
    /// case-insensitive title match.
    pub async fn find_for_member(
        &self,
        user_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<Trip>, ApiError> {
        let membership = doc! {
            "$or": [
                { "createdBy": user_id },
                { "participants": user_id },
            ]
        };
        let filter = match search {
            Some(term) if !term.is_empty() => doc! {
                "$and": [
                    membership,
                    { "title": { "$regex": term, "$options": "i" } },
                ]
            },
            _ => membership,
        };
        let cursor = self.collection.find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update_details(&self, id: &str, title: &str, date: &str) -> Result<(), ApiError> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "title": title, "date": date } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn add_participant(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$addToSet": { "participants": user_id } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn remove_participant(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$pull": { "participants": user_id } },
                None,
            )
            .await?;
        Ok(())
    }

    /// Document-atomic increment of the running total. Pass a negative
    /// amount to reverse a deleted expense.
    pub async fn add_to_total(&self, id: &str, amount: f64) -> Result<(), ApiError> {
        self.collection
            .update_one(doc! { "id": id }, doc! { "$inc": { "total": amount } }, None)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.collection.delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }
}

#[async_trait]
impl TripSource for TripStore {
    async fn trips_for_participant(&self, user_id: &str) -> Result<Vec<Trip>, ApiError> {
        let cursor = self
            .collection
            .find(doc! { "participants": user_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[derive(Clone)]
pub struct ExpenseStore {
    collection: Collection<Expense>,
}

impl ExpenseStore {
    pub async fn insert(&self, expense: &Expense) -> Result<(), ApiError> {
        self.collection.insert_one(expense, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Expense>, ApiError> {
        Ok(self.collection.find_one(doc! { "id": id }, None).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.collection.delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    pub async fn delete_for_trip(&self, trip_id: &str) -> Result<(), ApiError> {
        self.collection
            .delete_many(doc! { "tripId": trip_id }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ExpenseSource for ExpenseStore {
    async fn expenses_for_trip(&self, trip_id: &str) -> Result<Vec<Expense>, ApiError> {
        let cursor = self
            .collection
            .find(doc! { "tripId": trip_id }, None)
            .await?;
        let mut expenses: Vec<Expense> = cursor.try_collect().await?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }
}

#[derive(Clone)]
pub struct NotificationStore {
    collection: Collection<Notification>,
}

impl NotificationStore {
    pub async fn insert(&self, notification: &Notification) -> Result<(), ApiError> {
        self.collection.insert_one(notification, None).await?;
        Ok(())
    }

    pub async fn insert_many(&self, notifications: &[Notification]) -> Result<(), ApiError> {
        if notifications.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(notifications, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, ApiError> {
        Ok(self.collection.find_one(doc! { "id": id }, None).await?)
    }

    pub async fn find_for_recipient(&self, user_id: &str) -> Result<Vec<Notification>, ApiError> {
        let cursor = self
            .collection
            .find(doc! { "recipient": user_id }, None)
            .await?;
        let mut notifications: Vec<Notification> = cursor.try_collect().await?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub async fn pending_invite_exists(
        &self,
        recipient: &str,
        trip_id: &str,
    ) -> Result<bool, ApiError> {
        let filter = doc! {
            "recipient": recipient,
            "tripId": trip_id,
            "type": "TRIP_INVITE",
            "status": "PENDING",
        };
        Ok(self.collection.find_one(filter, None).await?.is_some())
    }

    pub async fn set_status(&self, id: &str, status: NotificationStatus) -> Result<(), ApiError> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "status": status.as_str() } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn delete_for_trip(&self, trip_id: &str) -> Result<(), ApiError> {
        self.collection
            .delete_many(doc! { "tripId": trip_id }, None)
            .await?;
        Ok(())
    }
}
