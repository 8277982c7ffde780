use actix_cors::Cors;
use actix_web::{get, http, middleware::Logger, web, App, HttpResponse, HttpServer};
use mongodb::Client;
use tracing::info;

mod auth;
mod balance;
mod config;
mod db;
mod error;
mod images;
mod routes;
mod schemas;

use crate::config::AppConfig;
use crate::db::Stores;
use crate::images::ImageSearch;

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok().body("Server is running")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env().expect("incomplete environment configuration");
    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .expect("failed to connect");
    info!("connected to MongoDB");

    let stores = Stores::new(&client, &config.database_name);
    let images = ImageSearch::new(config.unsplash_access_key.clone());
    let listen_addr = config.listen_addr;
    info!("listening on {listen_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
            .supports_credentials();
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(stores.clone()))
            .app_data(web::Data::new(images.clone()))
            .service(index)
            .configure(routes::configure)
    })
    .bind(listen_addr)?
    .run()
    .await
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tripsplit=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
