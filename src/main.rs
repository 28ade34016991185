//! Member Portal Backend
//! Mission: User accounts with JWT auth, RBAC, and brute-force lockout

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Json, Router};
use dotenv::dotenv;
use portal_backend::auth::{
    api as user_api, AuthState, LoginAttemptTracker, TokenProvider, UserService, UserStore,
};
use portal_backend::email::LogMailer;
use portal_backend::middleware::request_logging;
use serde_json::json;
use std::{env, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🚀 Member Portal backend starting");

    let db_path = env::var("PORTAL_DB_PATH").unwrap_or_else(|_| "portal_users.db".to_string());
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
    let bind_addr = env::var("PORTAL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_string());

    let store = Arc::new(UserStore::new(&db_path)?);
    let attempts = LoginAttemptTracker::default();
    let service = Arc::new(UserService::new(
        store,
        attempts.clone(),
        Arc::new(LogMailer),
    ));
    let token_provider = Arc::new(TokenProvider::new(jwt_secret));
    let auth_state = AuthState::new(service, token_provider);

    info!(db_path, "🔐 User store initialized");

    // Periodic sweep of expired login-attempt records.
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            attempts.cleanup();
        }
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(user_api::router(auth_state))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("🎯 API server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
