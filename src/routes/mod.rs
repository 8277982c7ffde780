use actix_web::web;

pub mod auth;
pub mod expenses;
pub mod notifications;
pub mod trips;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(auth::change_password),
    )
    .service(
        web::scope("/api/trips")
            .service(trips::list_trips)
            .service(trips::create_trip)
            .service(trips::get_trip)
            .service(trips::update_trip)
            .service(trips::delete_trip)
            .service(trips::leave_trip)
            .service(trips::invite_participant),
    )
    .service(
        web::scope("/api/expenses")
            .service(expenses::create_expense)
            .service(expenses::list_expenses)
            .service(expenses::delete_expense),
    )
    .service(
        web::scope("/api/users")
            .service(users::get_balance)
            .service(users::search_users),
    )
    .service(
        web::scope("/api/notifications")
            .service(notifications::list_notifications)
            .service(notifications::accept_notification)
            .service(notifications::reject_notification),
    );
}
