//! Public handlers served by the shell itself

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;

pub const SERVICE_NAME: &str = "animal-happiness-api";
pub const WELCOME_MESSAGE: &str =
    "Welcome to the Animal Happiness API. Use the /animal/data endpoints for access.";

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE,
    })
}

pub async fn health() -> Json<HealthResponse> {
    info!("health check endpoint called");
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        service: SERVICE_NAME,
    })
}

pub async fn not_found() -> AppError {
    AppError::not_found("not_found", "Not Found")
}

pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed("method_not_allowed", "Method Not Allowed")
}
