// timetrack/backend-api/src/main.rs
mod auth_utils;
mod config;
mod credentials;
mod db;
mod error_handler;
mod handlers;
mod models;
pub mod schema;
mod state;
#[cfg(test)]
mod test_support;
mod timestamps;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use config::AppConfig;
use state::AppState;
use std::io;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialiser le logger
    env_logger::init();

    // Charger les variables d'environnement
    if cfg!(debug_assertions) {
        match dotenvy::dotenv() {
            Ok(path) => log::info!(".env file loaded from path: {}", path.display()),
            Err(e) => log::warn!(
                "Could not load .env file: {}, using environment variables.",
                e
            ),
        }
    }

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = db::create_pool(&config.database_url, config.pool_max_size)
        .await
        .map_err(|e| startup_error("Failed to create database connection pool", e))?;

    db::ensure_schema(&pool)
        .await
        .map_err(|e| startup_error("Failed to apply database schema", e))?;

    let app_state = web::Data::new(AppState::new(pool, &config));

    log::info!("🚀 TimeTrack Backend Service starting...");
    log::info!("Server will start at http://{}", config.bind_address());

    let frontend_url_prod = config.frontend_url_prod.clone();
    let frontend_url_dev = config.frontend_url_dev.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url_prod)
            .allowed_origin(&frontend_url_dev)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-csrf-token"),
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(handlers::configure_api)
    })
    .bind(config.bind_address())?
    .run()
    .await
}
