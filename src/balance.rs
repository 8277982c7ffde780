use serde::Serialize;

use crate::db::{ExpenseSource, TripSource};
use crate::error::ApiError;
use crate::schemas::{Expense, Trip};

/// A user's aggregate settlement position across all their trips.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub to_pay: f64,
    pub to_receive: f64,
}

/// Equal-split settlement over already-fetched trips.
///
/// Each expense in a trip with N participants splits into N equal shares:
/// the payer is owed the other N-1 shares, every other participant owes one
/// share. Trips without participants contribute nothing. Trips never net
/// against each other.
pub fn compute_balance(user_id: &str, trips: &[(Trip, Vec<Expense>)]) -> Balance {
    let mut to_pay = 0.0;
    let mut to_receive = 0.0;

    for (trip, expenses) in trips {
        let split_count = trip.participants.len();
        if split_count == 0 {
            continue;
        }
        for expense in expenses {
            let share = expense.amount / split_count as f64;
            if expense.paid_by == user_id {
                to_receive += expense.amount - share;
            } else {
                to_pay += share;
            }
        }
    }

    Balance {
        to_pay: round_to_2_decimals(to_pay),
        to_receive: round_to_2_decimals(to_receive),
    }
}

/// Runs the two sequential store reads and folds them into a [`Balance`].
/// A failed read aborts the whole computation; there is no partial result.
pub async fn balance_for_user<T, E>(
    user_id: &str,
    trips: &T,
    expenses: &E,
) -> Result<Balance, ApiError>
where
    T: TripSource + ?Sized,
    E: ExpenseSource + ?Sized,
{
    let mut gathered = Vec::new();
    for trip in trips.trips_for_participant(user_id).await? {
        let trip_expenses = expenses.expenses_for_trip(&trip.id).await?;
        gathered.push((trip, trip_expenses));
    }
    Ok(compute_balance(user_id, &gathered))
}

fn round_to_2_decimals(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::schemas::new_id;

    fn trip(participants: &[&str]) -> Trip {
        Trip {
            id: new_id(),
            title: "Lisbon".to_string(),
            date: "August 2026".to_string(),
            start_date: None,
            end_date: None,
            total: 0.0,
            share: 0.0,
            image: String::new(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            created_by: participants.first().unwrap_or(&"ghost").to_string(),
            created_at: Utc::now(),
        }
    }

    fn expense(trip: &Trip, amount: f64, paid_by: &str) -> Expense {
        Expense {
            id: new_id(),
            description: "dinner".to_string(),
            amount,
            paid_by: paid_by.to_string(),
            date: Utc::now(),
            trip_id: trip.id.clone(),
            created_by: paid_by.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn two_participants_split_a_hundred_evenly() {
        let trip = trip(&["ana", "bruno"]);
        let data = vec![(trip.clone(), vec![expense(&trip, 100.0, "ana")])];

        let ana = compute_balance("ana", &data);
        assert_eq!(ana.to_receive, 50.0);
        assert_eq!(ana.to_pay, 0.0);

        let bruno = compute_balance("bruno", &data);
        assert_eq!(bruno.to_pay, 50.0);
        assert_eq!(bruno.to_receive, 0.0);
    }

    #[test]
    fn payer_among_three_is_owed_the_other_shares() {
        let trip = trip(&["ana", "bruno", "clara"]);
        let data = vec![(trip.clone(), vec![expense(&trip, 90.0, "ana")])];

        assert_eq!(compute_balance("ana", &data).to_receive, 60.0);
        assert_eq!(compute_balance("bruno", &data).to_pay, 30.0);
        assert_eq!(compute_balance("clara", &data).to_pay, 30.0);
    }

    #[test]
    fn one_expense_nets_to_zero_across_all_participants() {
        let trip = trip(&["ana", "bruno", "clara"]);
        let data = vec![(trip.clone(), vec![expense(&trip, 90.0, "bruno")])];

        let net: f64 = ["ana", "bruno", "clara"]
            .iter()
            .map(|user| {
                let balance = compute_balance(user, &data);
                balance.to_receive - balance.to_pay
            })
            .sum();
        assert_eq!(net, 0.0);
    }

    #[test]
    fn trip_without_participants_contributes_nothing() {
        let trip = trip(&[]);
        let data = vec![(trip.clone(), vec![expense(&trip, 100.0, "ana")])];

        let balance = compute_balance("ana", &data);
        assert_eq!(balance.to_pay, 0.0);
        assert_eq!(balance.to_receive, 0.0);
    }

    #[test]
    fn trips_are_settled_independently() {
        let first = trip(&["ana", "bruno"]);
        let second = trip(&["ana", "bruno"]);
        let data = vec![
            (first.clone(), vec![expense(&first, 100.0, "ana")]),
            (second.clone(), vec![expense(&second, 40.0, "bruno")]),
        ];

        // No netting across trips: ana is owed 50 in one and owes 20 in the
        // other, never a single 30 figure.
        let ana = compute_balance("ana", &data);
        assert_eq!(ana.to_receive, 50.0);
        assert_eq!(ana.to_pay, 20.0);
    }

    #[test]
    fn removing_an_expense_restores_the_previous_balance() {
        let trip = trip(&["ana", "bruno"]);
        let before = compute_balance("bruno", &[(trip.clone(), vec![])]);
        let with = compute_balance(
            "bruno",
            &[(trip.clone(), vec![expense(&trip, 75.5, "ana")])],
        );
        let after = compute_balance("bruno", &[(trip.clone(), vec![])]);

        assert_ne!(with, before);
        assert_eq!(after, before);
    }

    #[test]
    fn shares_round_to_two_decimals() {
        let trip = trip(&["ana", "bruno", "clara"]);
        let data = vec![(trip.clone(), vec![expense(&trip, 100.0, "ana")])];

        assert_eq!(compute_balance("bruno", &data).to_pay, 33.33);
        assert_eq!(compute_balance("ana", &data).to_receive, 66.67);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_to_2_decimals(0.125), 0.13);
        assert_eq!(round_to_2_decimals(-0.125), -0.13);
        assert_eq!(round_to_2_decimals(33.333333), 33.33);
    }

    struct FakeTrips(Vec<Trip>);

    #[async_trait]
    impl TripSource for FakeTrips {
        async fn trips_for_participant(&self, user_id: &str) -> Result<Vec<Trip>, ApiError> {
            Ok(self
                .0
                .iter()
                .filter(|trip| trip.participants.iter().any(|p| p == user_id))
                .cloned()
                .collect())
        }
    }

    struct FakeExpenses(Vec<Expense>);

    #[async_trait]
    impl ExpenseSource for FakeExpenses {
        async fn expenses_for_trip(&self, trip_id: &str) -> Result<Vec<Expense>, ApiError> {
            Ok(self
                .0
                .iter()
                .filter(|expense| expense.trip_id == trip_id)
                .cloned()
                .collect())
        }
    }

    struct FailingExpenses;

    #[async_trait]
    impl ExpenseSource for FailingExpenses {
        async fn expenses_for_trip(&self, _trip_id: &str) -> Result<Vec<Expense>, ApiError> {
            Err(ApiError::Internal("expense read failed".to_string()))
        }
    }

    #[actix_web::test]
    async fn balance_only_counts_trips_the_user_is_on() {
        let mine = trip(&["ana", "bruno"]);
        let theirs = trip(&["clara", "dora"]);
        let expenses = FakeExpenses(vec![
            expense(&mine, 100.0, "bruno"),
            expense(&theirs, 500.0, "clara"),
        ]);
        let trips = FakeTrips(vec![mine, theirs]);

        let balance = balance_for_user("ana", &trips, &expenses).await.unwrap();
        assert_eq!(balance.to_pay, 50.0);
        assert_eq!(balance.to_receive, 0.0);
    }

    #[actix_web::test]
    async fn failed_expense_read_aborts_the_whole_computation() {
        let trips = FakeTrips(vec![trip(&["ana", "bruno"])]);
        let result = balance_for_user("ana", &trips, &FailingExpenses).await;
        assert!(result.is_err());
    }
}
