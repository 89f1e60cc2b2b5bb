mod config;
mod constants;
mod domain;
mod media;
mod models;
mod routes;
mod services;
mod storage;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use google_cloud_storage::client::Storage;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use config::Config;
use constants::MAX_UPLOAD_SIZE;
use storage::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: MediaStore,
    pub jwt_secret: Vec<u8>,
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().unwrap_or_else(|e| panic!("Config error: {}", e));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // GCS client uses GOOGLE_APPLICATION_CREDENTIALS env var
    let gcs = Storage::builder()
        .build()
        .await
        .expect("Failed to create GCS client");
    let media_store = MediaStore::new(gcs, config.bucket.clone());

    let state = Arc::new(AppState {
        db: pool,
        storage: media_store,
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = routes::build_routes()
        .layer(build_cors(&config.cors_origins))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", config.bind_addr, e));

    println!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await.expect("Server failed");
}
