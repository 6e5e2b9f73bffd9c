//! HTTP surface of the relay.

use crate::api::GrammarBotClient;
use crate::config::Config;
use crate::error::RelayError;
use crate::services::{CheckRequest, RelayService};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub relay: RelayService,
    pub max_body_bytes: usize,
}

#[derive(Serialize)]
struct Health {
    ok: bool,
    service: &'static str,
}

pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/geterror", post(check_text))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Wire the GrammarBot client and relay settings from config into a router
pub fn build_app(config: &Config) -> Result<Router> {
    let client = GrammarBotClient::new(&config.grammarbot)
        .context("failed to build GrammarBot HTTP client")?;

    let state = AppState {
        relay: RelayService::new(Arc::new(client), config.relay.error_mode),
        max_body_bytes: config.server.max_body_bytes,
    };
    Ok(router(state))
}

pub async fn serve(config: &Config) -> Result<()> {
    let app = build_app(config)?;
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        "listening on http://{} (upstream {}, error mode {})",
        addr, config.grammarbot.base_url, config.relay.error_mode
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn check_text(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let Json(body) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge {
                limit: state.max_body_bytes,
            }
        } else {
            RelayError::InvalidJson {
                reason: rejection.body_text(),
            }
        }
    })?;

    let result = state.relay.relay(CheckRequest::from_json(&body)).await?;
    Ok(Json(result))
}

async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        service: "grammar-relay",
    })
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "no such route"
        })),
    )
}
