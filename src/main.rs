// src/main.rs
use actix_web::http::Method;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use conceptshot::services::{upstream::DEFAULT_UPSTREAM_URL, UpstreamClient};
use conceptshot::{handlers, AppState};
use log::info;
use std::sync::Arc;
use std::time::Duration;

const ALLOWED_HEADERS: &str =
    "authorization, x-client-info, apikey, content-type, x-app-secret";

/// Base64 payloads for a main shot plus two reference images stay well under
/// this once resized to the 1024px edge cap.
const JSON_PAYLOAD_LIMIT: usize = 25 * 1024 * 1024;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting conceptshot gateway proxy...");

    let upstream_url =
        std::env::var("UPSTREAM_URL").unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string());
    let api_key = std::env::var("UPSTREAM_API_KEY").context("UPSTREAM_API_KEY must be set")?;
    let app_secret = std::env::var("APP_SECRET").ok();
    let timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let upstream = Arc::new(UpstreamClient::new(
        upstream_url,
        api_key,
        Duration::from_secs(timeout_secs),
    )?);
    let app_state = AppState {
        upstream,
        app_secret,
    };

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .wrap(middleware::Logger::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", ALLOWED_HEADERS)),
            )
            .route(
                "/functions/analyze-product",
                web::post().to(handlers::analyze_product),
            )
            .route(
                "/functions/analyze-product",
                web::route()
                    .method(Method::OPTIONS)
                    .to(handlers::preflight),
            )
            .route("/health", web::get().to(handlers::health))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
